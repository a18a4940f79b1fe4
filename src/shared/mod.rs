//! Shared Module
//!
//! Types shared by every part of the queue: the report model, the error
//! types it raises, and the application configuration values.

/// Report input, queued record, and upload payload
pub mod report;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

pub use report::{PendingReport, ReportInput, ReportPayload};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
