//! # CLI Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Flama                                  │
//! │                                                                         │
//! │  $ flama rules set --product P99 --mode simple --price 10              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  CliResult<()>                                                   │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::ForeignKeyViolation ──┐           │  │
//! │  │         │                                           │           │  │
//! │  │         ▼                                           ▼           │  │
//! │  │  Domain Error? ─── CoreError::InvalidOrderStatus ── CliError    │  │
//! │  └──────────────────────────────────────────────────────────┬───────┘  │
//! │                                                             │          │
//! │  stderr: "error: Invalid reference (unknown product...)"  ◄─┘          │
//! │  exit code: 2                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use flama_core::{CoreError, ValidationError};
use flama_db::DbError;
use serde::Serialize;

/// Error returned from CLI commands.
///
/// With `--json` this is what a script reads from stderr:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Order not found: 7c9e..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes, each with its own process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// A business rule refused the operation
    BusinessLogic,

    /// Database operation failed
    DatabaseError,

    /// Input file missing or unreadable
    InputError,

    /// Configuration is invalid
    ConfigError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Process exit code for this error class.
    pub const fn exit_code(self) -> u8 {
        match self {
            ErrorCode::Internal => 1,
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::BusinessLogic => 4,
            ErrorCode::DatabaseError => 5,
            ErrorCode::InputError => 6,
            ErrorCode::ConfigError => 7,
        }
    }
}

impl CliError {
    /// Creates a new CLI error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an input file error.
    pub fn input(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::InputError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.code.exit_code()
    }
}

/// Converts database errors to CLI errors.
impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            DbError::UniqueViolation { field, .. } => {
                CliError::validation(format!("{} already exists", field))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                CliError::validation("Invalid reference (unknown product, deposit or client)")
            }
            DbError::ConstraintViolation(message) => {
                tracing::error!("Constraint violation: {}", message);
                CliError::validation("Value rejected by the database")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::CorruptRow { entity, id, reason } => {
                tracing::error!(entity = %entity, id = %id, "Corrupt row: {}", reason);
                CliError::new(
                    ErrorCode::DatabaseError,
                    format!("{} {} could not be read", entity, id),
                )
            }
            DbError::Domain(core) => CliError::from(core),
            DbError::PoolExhausted => {
                CliError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to CLI errors.
impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => CliError::not_found("Product", &id),
            CoreError::OrderNotFound(id) => CliError::not_found("Order", &id),
            CoreError::ProductNotInOrder(id) => CliError::not_found("Order line", &id),
            CoreError::ProductInactive(_)
            | CoreError::InvalidOrderStatus { .. }
            | CoreError::OrderTooLarge { .. }
            | CoreError::TotalOverflow => {
                CliError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::QuantityTooLarge { .. } => CliError::validation(err.to_string()),
            CoreError::InvalidLegacyStore(reason) => {
                CliError::input(format!("Invalid legacy store: {}", reason))
            }
            CoreError::Validation(e) => CliError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
