//! # Legacy Store
//!
//! Reads and cleans dumps of the browser cache the old front-end used as
//! its offline store.
//!
//! ## Dump Layout
//! ```text
//! {
//!   "depositos":     "[{\"id\":1,\"nome\":\"Centro\"}]",   ← JSON string
//!   "produtos":      [{ "id": "p13", "nome": "P13" }],     ← or a real array
//!   "precos":        [{ "produto_id": "p13", "preco": 110 }],
//!   "offline_queue": [...],                                ← retired sync queue
//!   "sync_last_run": "2023-11-02T10:00:00Z",               ← retired sync queue
//!   "theme":         "dark"                                ← left untouched
//! }
//! ```
//!
//! The offline sync queue is gone for good; [`LegacyStore::purge_offline_queue`]
//! strips whatever it left behind. [`LegacyStore::extract`] pulls the entity
//! collections out through the normalizer so they can be imported.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{CoreError, CoreResult};
use crate::normalize;
use crate::pricing::PricingRule;
use crate::types::{Client, Deposit, Product};

pub const DEPOSIT_COLLECTION_KEYS: &[&str] = &["depositos", "deposits"];
pub const PRODUCT_COLLECTION_KEYS: &[&str] = &["produtos", "products"];
pub const CLIENT_COLLECTION_KEYS: &[&str] = &["clientes", "clients"];
pub const PRICING_COLLECTION_KEYS: &[&str] = &["precos", "precos_deposito", "pricing_rules", "prices"];

/// Exact keys of the retired offline queue.
pub const OFFLINE_QUEUE_KEYS: &[&str] = &[
    "offline_queue",
    "offlineQueue",
    "fila_offline",
    "pending_sync",
    "pendingSync",
    "sync_queue",
];

/// Key prefixes of the retired offline queue.
pub const OFFLINE_QUEUE_PREFIXES: &[&str] = &["offline_", "sync_"];

/// Whether `key` belongs to the retired offline queue.
pub fn is_offline_queue_key(key: &str) -> bool {
    OFFLINE_QUEUE_KEYS.contains(&key) || OFFLINE_QUEUE_PREFIXES.iter().any(|p| key.starts_with(p))
}

// =============================================================================
// Store
// =============================================================================

/// A parsed legacy store dump.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyStore {
    entries: Map<String, Value>,
}

impl LegacyStore {
    /// Parses a dump. The top level must be a JSON object.
    pub fn from_json_str(raw: &str) -> CoreResult<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| CoreError::InvalidLegacyStore(e.to_string()))?;

        match value {
            Value::Object(entries) => Ok(LegacyStore { entries }),
            other => Err(CoreError::InvalidLegacyStore(format!(
                "expected a JSON object at the top level, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys that [`purge_offline_queue`](Self::purge_offline_queue) would remove, sorted.
    pub fn offline_queue_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .keys()
            .filter(|k| is_offline_queue_key(k))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Removes every offline queue entry and returns the removed keys,
    /// sorted. Running it again removes nothing.
    pub fn purge_offline_queue(&mut self) -> Vec<String> {
        let removed = self.offline_queue_keys();
        for key in &removed {
            self.entries.remove(key);
        }
        removed
    }

    /// Raw records of the first collection key present.
    ///
    /// Values may be arrays or strings holding a JSON array (the browser
    /// cache only stores strings). Anything else reads as empty.
    pub fn collection(&self, keys: &[&str]) -> Vec<Value> {
        let Some(value) = keys.iter().find_map(|k| self.entries.get(*k)) else {
            return Vec::new();
        };

        match value {
            Value::Array(items) => items.clone(),
            Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
                Ok(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Normalizes every entity collection.
    pub fn extract(&self) -> LegacyExtract {
        let (deposits, deposit_report) =
            extract_collection("deposits", self.collection(DEPOSIT_COLLECTION_KEYS), normalize::deposit);
        let (products, product_report) =
            extract_collection("products", self.collection(PRODUCT_COLLECTION_KEYS), normalize::product);
        let (clients, client_report) =
            extract_collection("clients", self.collection(CLIENT_COLLECTION_KEYS), normalize::client);
        let (pricing_rules, mut pricing_report) = extract_collection(
            "pricing_rules",
            self.collection(PRICING_COLLECTION_KEYS),
            normalize::pricing_rule,
        );
        let pricing_rules = first_rule_per_key(pricing_rules, &mut pricing_report);

        LegacyExtract {
            deposits,
            products,
            clients,
            pricing_rules,
            reports: vec![deposit_report, product_report, client_report, pricing_report],
        }
    }

    /// Serializes the (possibly purged) store back to a dump.
    pub fn to_json_string_pretty(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(&self.entries)
            .map_err(|e| CoreError::InvalidLegacyStore(e.to_string()))
    }
}

fn extract_collection<T>(
    name: &str,
    rows: Vec<Value>,
    normalize_one: impl Fn(&Value) -> Option<T>,
) -> (Vec<T>, CollectionReport) {
    let total = rows.len();
    let records: Vec<T> = rows.iter().filter_map(normalize_one).collect();
    let report = CollectionReport {
        collection: name.to_string(),
        imported: records.len(),
        skipped: total - records.len(),
    };
    (records, report)
}

/// Keeps the first rule for each (product, deposit, mode). The database
/// holds one row per key and the resolver picks the first match inside a
/// deposit, so later duplicates are counted as skipped.
fn first_rule_per_key(rules: Vec<PricingRule>, report: &mut CollectionReport) -> Vec<PricingRule> {
    let mut seen = HashSet::new();
    let kept: Vec<PricingRule> = rules
        .into_iter()
        .filter(|r| seen.insert((r.product_id.clone(), r.deposit_id.clone(), r.mode)))
        .collect();

    let dropped = report.imported - kept.len();
    report.imported -= dropped;
    report.skipped += dropped;
    kept
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Extract Results
// =============================================================================

/// Per-collection import counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub collection: String,
    pub imported: usize,
    pub skipped: usize,
}

/// Entities recovered from a dump.
#[derive(Debug, Clone, Default)]
pub struct LegacyExtract {
    pub deposits: Vec<Deposit>,
    pub products: Vec<Product>,
    pub clients: Vec<Client>,
    pub pricing_rules: Vec<PricingRule>,
    pub reports: Vec<CollectionReport>,
}

impl LegacyExtract {
    pub fn total_imported(&self) -> usize {
        self.reports.iter().map(|r| r.imported).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.reports.iter().map(|r| r.skipped).sum()
    }
}
