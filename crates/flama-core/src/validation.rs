//! # Validation Module
//!
//! Input checks applied before anything is written to the database.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  operator input (CLI flags, legacy import)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  THIS MODULE: business rules (lengths, quantities, CPF/CNPJ shape)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: NOT NULL, UNIQUE, FOREIGN KEY, CHECK                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices are deliberately absent: overrides may be zero or negative.

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest identifier accepted for products, deposits and clients.
pub const MAX_ID_LEN: usize = 64;

/// Longest display name.
pub const MAX_NAME_LEN: usize = 120;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity identifier and returns it trimmed.
///
/// Identifiers are either UUIDs or the legacy numeric/slug ids, so only
/// letters, digits, `-`, `_` and `.` are allowed.
///
/// ## Example
/// ```rust
/// use flama_core::validation::validate_id;
///
/// assert_eq!(validate_id("product_id", " P13 ").unwrap(), "P13");
/// assert!(validate_id("product_id", "").is_err());
/// assert!(validate_id("product_id", "P 13").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<String> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.chars().count() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, '-', '_' and '.'".to_string(),
        });
    }

    Ok(id.to_string())
}

/// Validates a display name (deposit, product, client) and returns it
/// trimmed.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a search query.
///
/// Empty is fine (lists everything). Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a CPF or CNPJ and returns its digits.
///
/// Punctuation is ignored; only the length is checked (11 digits for CPF,
/// 14 for CNPJ).
///
/// ## Example
/// ```rust
/// use flama_core::validation::validate_document;
///
/// assert_eq!(validate_document("123.456.789-09").unwrap(), "12345678909");
/// assert!(validate_document("12.345.678/0001-90").is_ok());
/// assert!(validate_document("1234").is_err());
/// ```
pub fn validate_document(raw: &str) -> ValidationResult<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "document".to_string(),
        });
    }

    match digits.len() {
        11 | 14 => Ok(digits),
        n => Err(ValidationError::InvalidFormat {
            field: "document".to_string(),
            reason: format!("expected 11 (CPF) or 14 (CNPJ) digits, got {}", n),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Checks that one more line fits in an order holding `current_lines`.
pub fn validate_order_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "order lines".to_string(),
            min: 0,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

/// Validates a UUID string (order ids).
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id("id", "13").unwrap(), "13");
        assert!(validate_id("id", "deposito-centro").is_ok());
        assert!(validate_id("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());

        assert!(matches!(
            validate_id("deposit_id", "  "),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_id("id", "a/b").is_err());
        assert!(validate_id("id", &"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", "  Botijão P13 ").unwrap(), "Botijão P13");
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"ã".repeat(120)).is_ok());
        assert!(validate_name("name", &"a".repeat(121)).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  gás ").unwrap(), "gás");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_document() {
        assert_eq!(validate_document("12.345.678/0001-90").unwrap(), "12345678000190");
        assert!(matches!(
            validate_document("abc"),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_document("123456789"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_order_size() {
        assert!(validate_order_size(0).is_ok());
        assert!(validate_order_size(99).is_ok());
        assert!(validate_order_size(100).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
