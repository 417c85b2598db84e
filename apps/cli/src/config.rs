//! # Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command line flags (`--db`)
//! 2. Environment variables (`FLAMA_*`), including those from `.env`
//! 3. Defaults (this file)

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default tracing filter when neither `RUST_LOG` nor `FLAMA_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,flama=debug,sqlx=warn";

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Decimal mark, `,` in pt-BR
    pub decimal_separator: char,

    /// Thousands grouping mark, `.` in pt-BR
    pub thousands_separator: char,

    /// Maximum rows returned by list/search commands.
    pub search_limit: u32,

    /// tracing `EnvFilter` directives.
    pub log_filter: String,
}

impl Default for ConfigState {
    /// ## Default Values
    /// - Database: platform data dir (`~/.local/share/flama/flama.db` on Linux)
    /// - Currency: R$ with pt-BR separators
    /// - Lists: 20 rows
    fn default() -> Self {
        ConfigState {
            database_path: default_database_path(),
            currency_symbol: "R$".to_string(),
            decimal_separator: ',',
            thousands_separator: '.',
            search_limit: 20,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ConfigState {
    /// Loads configuration from the process environment.
    ///
    /// ## Environment Variables
    /// - `FLAMA_DATABASE_PATH`: SQLite file
    /// - `FLAMA_CURRENCY_SYMBOL`: e.g. "R$", "US$"
    /// - `FLAMA_SEARCH_LIMIT`: rows per list, 1..=500
    /// - `FLAMA_LOG`: tracing filter
    pub fn from_env() -> Result<Self, ConfigError> {
        ConfigState::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = ConfigState::default();

        if let Some(path) = lookup("FLAMA_DATABASE_PATH").filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(symbol) = lookup("FLAMA_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(raw) = lookup("FLAMA_SEARCH_LIMIT") {
            config.search_limit = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=500).contains(n))
                .ok_or_else(|| ConfigError::InvalidValue("FLAMA_SEARCH_LIMIT".to_string()))?;
        }

        if let Some(filter) = lookup("FLAMA_LOG").filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }

        Ok(config)
    }

    /// Formats a centavo amount with the configured symbol and separators.
    /// Always two decimal places, the scale of [`flama_core::Money`].
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(123456), "R$1.234,56");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let magnitude = cents.unsigned_abs();
        let whole = magnitude / 100;
        let frac = magnitude % 100;

        let mut grouped = String::new();
        let digits = whole.to_string();
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(ch);
        }

        format!(
            "{}{}{}{}{:02}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            grouped,
            self.decimal_separator,
            frac
        )
    }
}

/// Platform data directory file, or `./flama.db` when there is none.
fn default_database_path() -> PathBuf {
    ProjectDirs::from("br", "flama", "flama")
        .map(|dirs| dirs.data_dir().join("flama.db"))
        .unwrap_or_else(|| PathBuf::from("flama.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
