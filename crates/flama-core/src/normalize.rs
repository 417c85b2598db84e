//! # Field Normalizer
//!
//! Turns raw JSON records into typed entities.
//!
//! Records reach us from three places with three naming habits: the hosted
//! database (`product_id`), the old front-end (`productId`) and the legacy
//! offline cache (`produto_id`, `preco_troca`, ...). Each field is looked up
//! through an ordered alias list; the first alias holding a usable value
//! wins.
//!
//! ```text
//! { "produtoId": 13, "preco": "110,00", "modalidade": "troca" }
//!          │                │                   │
//!          ▼                ▼                   ▼
//!   product_id "13"   price R$110,00     mode Exchange
//! ```
//!
//! Raw prices are reais, never centavos. Malformed records are dropped
//! silently, never reported as errors.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::money::Money;
use crate::pricing::{PricingMode, PricingRule};
use crate::types::{Client, Deposit, Product};

// =============================================================================
// Alias Tables
// =============================================================================

pub const PRODUCT_ID_KEYS: &[&str] = &["product_id", "productId", "produto_id", "produtoId", "id_produto"];
pub const DEPOSIT_ID_KEYS: &[&str] = &["deposit_id", "depositId", "deposito_id", "depositoId", "id_deposito"];
pub const MODE_KEYS: &[&str] = &["mode", "pricing_mode", "pricingMode", "modalidade", "tipo_venda", "tipo"];
pub const PRICE_KEYS: &[&str] = &["price", "preco", "preco_simples", "precoSimples", "valor"];
pub const EXCHANGE_PRICE_KEYS: &[&str] = &["exchange_price", "exchangePrice", "preco_troca", "precoTroca"];
pub const FULL_PRICE_KEYS: &[&str] = &[
    "full_price",
    "fullPrice",
    "preco_completa",
    "precoCompleta",
    "preco_completo",
];

pub const ID_KEYS: &[&str] = &["id", "uuid"];
pub const NAME_KEYS: &[&str] = &["name", "nome"];
pub const ADDRESS_KEYS: &[&str] = &["address", "endereco"];
pub const PHONE_KEYS: &[&str] = &["phone", "telefone"];
pub const DOCUMENT_KEYS: &[&str] = &["document", "cpf_cnpj", "documento"];
pub const DESCRIPTION_KEYS: &[&str] = &["description", "descricao"];
pub const UNIT_KEYS: &[&str] = &["unit", "unidade"];
pub const ACTIVE_KEYS: &[&str] = &["active", "ativo", "is_active"];
const CREATED_AT_KEYS: &[&str] = &["created_at", "createdAt", "criado_em"];
const UPDATED_AT_KEYS: &[&str] = &["updated_at", "updatedAt", "atualizado_em"];

// =============================================================================
// Field Readers
// =============================================================================

/// First alias whose value `read` accepts.
fn pick<T>(obj: &Map<String, Value>, keys: &[&str], read: impl Fn(&Value) -> Option<T>) -> Option<T> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(read)
}

/// An identifier: a non-empty trimmed string or an integer.
pub fn read_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// Free text: a non-empty trimmed string.
pub fn read_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        _ => None,
    }
}

/// A reais amount: a JSON number or a numeric string.
///
/// ## Example
/// ```rust
/// use flama_core::normalize::read_money;
/// use serde_json::json;
///
/// assert_eq!(read_money(&json!(110)).unwrap().cents(), 11000);
/// assert_eq!(read_money(&json!(99.9)).unwrap().cents(), 9990);
/// assert_eq!(read_money(&json!("1.234,56")).unwrap().cents(), 123456);
/// assert!(read_money(&json!("")).is_none());
/// assert!(read_money(&json!(null)).is_none());
/// ```
pub fn read_money(value: &Value) -> Option<Money> {
    match value {
        Value::Number(n) => {
            let amount = if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else if let Some(u) = n.as_u64() {
                Decimal::from(u)
            } else {
                // from_f64 refuses NaN and infinities
                Decimal::from_f64(n.as_f64()?)?
            };
            Money::from_decimal(amount)
        }
        Value::String(s) => Money::parse(s),
        _ => None,
    }
}

/// A flag: booleans, 0/1, and the usual yes/no words.
pub fn read_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "sim" | "s" | "yes" | "y" => Some(true),
            "false" | "0" | "nao" | "não" | "n" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn read_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

fn read_mode(obj: &Map<String, Value>) -> PricingMode {
    pick(obj, MODE_KEYS, |v| v.as_str().map(PricingMode::normalize)).unwrap_or_default()
}

fn read_active(obj: &Map<String, Value>) -> bool {
    pick(obj, ACTIVE_KEYS, read_bool).unwrap_or(true)
}

fn read_times(obj: &Map<String, Value>) -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    let created_at = pick(obj, CREATED_AT_KEYS, read_timestamp).unwrap_or(now);
    let updated_at = pick(obj, UPDATED_AT_KEYS, read_timestamp).unwrap_or(created_at);
    (created_at, updated_at)
}

// =============================================================================
// Record Normalizers
// =============================================================================

/// Normalizes one pricing override. `None` when the record is not an
/// object or carries no product id.
pub fn pricing_rule(raw: &Value) -> Option<PricingRule> {
    let obj = raw.as_object()?;
    let product_id = pick(obj, PRODUCT_ID_KEYS, read_id)?;

    Some(PricingRule {
        product_id,
        deposit_id: pick(obj, DEPOSIT_ID_KEYS, read_id),
        mode: read_mode(obj),
        price: pick(obj, PRICE_KEYS, read_money),
        exchange_price: pick(obj, EXCHANGE_PRICE_KEYS, read_money),
        full_price: pick(obj, FULL_PRICE_KEYS, read_money),
    })
}

/// Normalizes a collection of overrides, keeping their order and skipping
/// records that are not rules.
pub fn pricing_rules(rows: &[Value]) -> Vec<PricingRule> {
    rows.iter().filter_map(pricing_rule).collect()
}

pub fn deposit(raw: &Value) -> Option<Deposit> {
    let obj = raw.as_object()?;
    let (created_at, updated_at) = read_times(obj);

    Some(Deposit {
        id: pick(obj, ID_KEYS, read_id)?,
        name: pick(obj, NAME_KEYS, read_text)?,
        address: pick(obj, ADDRESS_KEYS, read_text),
        phone: pick(obj, PHONE_KEYS, read_text),
        is_active: read_active(obj),
        created_at,
        updated_at,
    })
}

pub fn product(raw: &Value) -> Option<Product> {
    let obj = raw.as_object()?;
    let (created_at, updated_at) = read_times(obj);

    Some(Product {
        id: pick(obj, ID_KEYS, read_id)?,
        name: pick(obj, NAME_KEYS, read_text)?,
        description: pick(obj, DESCRIPTION_KEYS, read_text),
        unit: pick(obj, UNIT_KEYS, read_text),
        is_active: read_active(obj),
        created_at,
        updated_at,
    })
}

/// Normalizes a client. The document keeps digits only; a document with
/// no digits is dropped.
pub fn client(raw: &Value) -> Option<Client> {
    let obj = raw.as_object()?;
    let (created_at, updated_at) = read_times(obj);

    let document = pick(obj, DOCUMENT_KEYS, read_id)
        .map(|d| d.chars().filter(char::is_ascii_digit).collect::<String>())
        .filter(|d| !d.is_empty());

    Some(Client {
        id: pick(obj, ID_KEYS, read_id)?,
        name: pick(obj, NAME_KEYS, read_text)?,
        document,
        phone: pick(obj, PHONE_KEYS, read_text),
        address: pick(obj, ADDRESS_KEYS, read_text),
        is_active: read_active(obj),
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_from_snake_case() {
        let rule = pricing_rule(&json!({
            "product_id": "P13",
            "deposit_id": "centro",
            "mode": "SIMPLE",
            "price": 110
        }))
        .unwrap();

        assert_eq!(rule.product_id, "P13");
        assert_eq!(rule.deposit_id.as_deref(), Some("centro"));
        assert_eq!(rule.mode, PricingMode::Simple);
        assert_eq!(rule.price, Some(Money::from_cents(11000)));
        assert_eq!(rule.exchange_price, None);
    }

    #[test]
    fn test_rule_from_camel_case() {
        let rule = pricing_rule(&json!({
            "productId": "P45",
            "depositId": "norte",
            "pricingMode": "exchange",
            "exchangePrice": 399.9,
            "fullPrice": "650.00"
        }))
        .unwrap();

        assert_eq!(rule.product_id, "P45");
        assert_eq!(rule.mode, PricingMode::Exchange);
        assert_eq!(rule.exchange_price, Some(Money::from_cents(39990)));
        assert_eq!(rule.full_price, Some(Money::from_cents(65000)));
    }

    #[test]
    fn test_rule_from_legacy_portuguese() {
        let rule = pricing_rule(&json!({
            "produto_id": 13,
            "deposito_id": 2,
            "modalidade": "Completa",
            "preco_completa": "R$ 1.250,50"
        }))
        .unwrap();

        assert_eq!(rule.product_id, "13");
        assert_eq!(rule.deposit_id.as_deref(), Some("2"));
        assert_eq!(rule.mode, PricingMode::Full);
        assert_eq!(rule.full_price, Some(Money::from_cents(125050)));
    }

    #[test]
    fn test_first_usable_alias_wins() {
        let rule = pricing_rule(&json!({
            "product_id": "  ",
            "productId": "P13",
            "price": null,
            "preco": "",
            "valor": 90
        }))
        .unwrap();

        assert_eq!(rule.product_id, "P13");
        assert_eq!(rule.price, Some(Money::from_cents(9000)));
    }

    #[test]
    fn test_missing_or_empty_deposit_is_global() {
        let rule = pricing_rule(&json!({ "product_id": "P13", "deposit_id": "" })).unwrap();
        assert!(rule.is_global());
        let rule = pricing_rule(&json!({ "product_id": "P13", "deposit_id": null })).unwrap();
        assert!(rule.is_global());
    }

    #[test]
    fn test_missing_mode_defaults_to_simple() {
        let rule = pricing_rule(&json!({ "product_id": "P13", "price": 1 })).unwrap();
        assert_eq!(rule.mode, PricingMode::Simple);
    }

    #[test]
    fn test_records_without_product_are_skipped() {
        let rows = vec![
            json!({ "deposit_id": "D1", "price": 10 }),
            json!([1, 2, 3]),
            json!(null),
            json!({ "product_id": { "nested": true }, "price": 10 }),
            json!({ "product_id": "P", "price": 10 }),
        ];
        let rules = pricing_rules(&rows);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].product_id, "P");
    }

    #[test]
    fn test_unusable_prices_are_not_resolvable() {
        let rule = pricing_rule(&json!({
            "product_id": "P",
            "price": "abc",
            "exchange_price": true,
            "full_price": [10]
        }))
        .unwrap();
        assert_eq!(rule.price, None);
        assert_eq!(rule.exchange_price, None);
        assert_eq!(rule.full_price, None);
    }

    #[test]
    fn test_read_money_forms() {
        assert_eq!(read_money(&json!(-5)).unwrap().cents(), -500);
        assert_eq!(read_money(&json!(0.125)).unwrap().cents(), 12);
        assert_eq!(read_money(&json!("110,5")).unwrap().cents(), 11050);
        assert!(read_money(&json!("NaN")).is_none());
        assert!(read_money(&json!("Infinity")).is_none());
        assert!(read_money(&json!({})).is_none());
    }

    #[test]
    fn test_read_bool_forms() {
        assert_eq!(read_bool(&json!(true)), Some(true));
        assert_eq!(read_bool(&json!(0)), Some(false));
        assert_eq!(read_bool(&json!("Sim")), Some(true));
        assert_eq!(read_bool(&json!("não")), Some(false));
        assert_eq!(read_bool(&json!("maybe")), None);
    }

    #[test]
    fn test_deposit_from_legacy_record() {
        let deposit = deposit(&json!({
            "id": 7,
            "nome": " Depósito Centro ",
            "endereco": "Rua A, 100",
            "ativo": false,
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(deposit.id, "7");
        assert_eq!(deposit.name, "Depósito Centro");
        assert_eq!(deposit.address.as_deref(), Some("Rua A, 100"));
        assert!(!deposit.is_active);
        assert_eq!(deposit.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert_eq!(deposit.updated_at, deposit.created_at);
    }

    #[test]
    fn test_product_requires_id_and_name() {
        assert!(product(&json!({ "nome": "Botijão P13" })).is_none());
        assert!(product(&json!({ "id": "p13" })).is_none());

        let product = product(&json!({ "uuid": "p13", "name": "Botijão P13", "unidade": "P13" })).unwrap();
        assert_eq!(product.unit.as_deref(), Some("P13"));
        assert!(product.is_active);
    }

    #[test]
    fn test_client_document_keeps_digits() {
        let client = client(&json!({
            "id": "c1",
            "nome": "Maria",
            "cpf_cnpj": "123.456.789-09",
            "telefone": "(85) 99999-0000"
        }))
        .unwrap();

        assert_eq!(client.document.as_deref(), Some("12345678909"));
        assert_eq!(client.phone.as_deref(), Some("(85) 99999-0000"));

    }

    #[test]
    fn test_client_document_without_digits_is_dropped() {
        let parsed = client(&json!({ "id": "c2", "name": "João", "documento": "n/a" })).unwrap();
        assert_eq!(parsed.document, None);
    }
}
