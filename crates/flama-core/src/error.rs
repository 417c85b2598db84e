//! # Domain Errors
//!
//! ```text
//! ValidationError ──► CoreError ──► DbError::Domain ──► CliError
//!   (bad input)       (business       (flama-db)         (apps/cli)
//!                      rule)
//! ```
//!
//! The resolver is absent from this list on purpose: an unmatched price is
//! a zero price, not an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The product is soft-deleted and cannot go on new orders.
    #[error("Product {0} is not available for sale")]
    ProductInactive(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Product {0} not in order")]
    ProductNotInOrder(String),

    /// Delivered and cancelled orders are final.
    #[error("Order {order_id} is {current_status}, cannot become {requested_status}")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
        requested_status: String,
    },

    #[error("Order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A line or order total does not fit in i64 centavos.
    #[error("Order total is too large")]
    TotalOverflow,

    /// The dump is not a JSON object, or could not be written back.
    #[error("Invalid legacy store: {0}")]
    InvalidLegacyStore(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Rejected operator input. `field` names the flag or record field.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Wrong shape: a CPF with 9 digits, an id with spaces.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {}", .allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = CoreError::InvalidOrderStatus {
            order_id: "ord-1".to_string(),
            current_status: "cancelled".to_string(),
            requested_status: "delivered".to_string(),
        };
        assert_eq!(err.to_string(), "Order ord-1 is cancelled, cannot become delivered");
    }

    #[test]
    fn test_not_allowed_lists_choices() {
        let err = ValidationError::NotAllowed {
            field: "status".to_string(),
            allowed: vec!["pending".to_string(), "delivered".to_string()],
        };
        assert_eq!(err.to_string(), "status must be one of: pending, delivered");
    }

    #[test]
    fn test_validation_lifts_into_core_error() {
        let core: CoreError = ValidationError::Required {
            field: "product_id".to_string(),
        }
        .into();
        assert!(matches!(core, CoreError::Validation(_)));
        assert_eq!(core.to_string(), "Validation error: product_id is required");
    }
}
