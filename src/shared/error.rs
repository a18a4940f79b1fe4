//! Shared Error Types
//!
//! Error types produced by the report model itself, independent of storage
//! or transport.
//!
//! # Usage
//!
//! ```rust
//! use water_report_sync::shared::error::SharedError;
//!
//! let error = SharedError::validation("location", "location is required");
//! assert!(error.to_string().contains("location"));
//! ```
use thiserror::Error;

/// Error types raised by shared report types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Field that failed validation
    pub fn field(&self) -> &str {
        match self {
            Self::ValidationError { field, .. } => field,
        }
    }
}
