//! Error types for `tickets`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - One variant per failure class the boundary contract names: missing
//!   primary entities, bad foreign references, uniqueness collisions
//! - Reference-validation failures collect every invalid id into a single
//!   error rather than failing one id at a time

use thiserror::Error;

/// Primary error type for `tickets` operations.
#[derive(Error, Debug)]
pub enum TicketsError {
    // === Lookup Errors ===
    /// A primary entity addressed by id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {errors:?}")]
    ValidationErrors { errors: Vec<ValidationError> },

    /// One or more referenced foreign ids do not exist.
    #[error("{entity} not found: {}", format_ids(.ids))]
    InvalidReferences { entity: &'static str, ids: Vec<i64> },

    /// Invalid status value.
    #[error("Invalid status: {status}")]
    InvalidStatus { status: String },

    // === Uniqueness Errors ===
    /// A unique column collided on insert or update.
    #[error("{entity} with {field} \"{value}\" already exists")]
    Uniqueness {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    // === Integrity Errors ===
    /// A stored row references a user that no longer exists. This is a
    /// data-integrity fault, not a recoverable "not found".
    #[error("Referential integrity violation: {message}")]
    Integrity { message: String },

    // === Credential Errors ===
    /// Unknown email and wrong password are deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    // === Infrastructure Errors ===
    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single field validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// The reason for the validation failure.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl TicketsError {
    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create from multiple validation errors.
    #[must_use]
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = &errors[0];
            Self::Validation {
                field: err.field.clone(),
                reason: err.message.clone(),
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }

    /// Can the user fix this without touching the data store?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Validation { .. }
                | Self::ValidationErrors { .. }
                | Self::InvalidReferences { .. }
                | Self::InvalidStatus { .. }
                | Self::Uniqueness { .. }
                | Self::InvalidCredentials
        )
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Result type using `TicketsError`.
pub type Result<T> = std::result::Result<T, TicketsError>;
