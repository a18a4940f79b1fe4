/**
 * Queue Error Types
 *
 * Errors surfaced by the public queue operations (submit, sync, store
 * access). Per-record upload failures inside a sync pass are not errors at
 * this level: they are counted in the pass summary instead.
 *
 * # Error Types
 *
 * - `Validation` - A required report field is missing; nothing was stored or sent
 * - `StorageUnavailable` - The queue database could not be opened
 * - `Storage` - A query against an open database failed
 * - `Rejected` - The server permanently refused an immediately-sent report
 * - `UploaderUnavailable` - The HTTP uploader could not be built
 * - `AlreadyInProgress` - A sync pass is already running; try again later
 */
use thiserror::Error;

use crate::shared::SharedError;
use crate::sync::upload::UploadError;

/// Errors returned by queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    /// Report failed field validation
    #[error(transparent)]
    Validation(#[from] SharedError),

    /// Persistence medium cannot be opened
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Query failed on an open database
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Server refused the report and retrying will not help
    #[error("Report rejected: {0}")]
    Rejected(UploadError),

    /// Upload collaborator could not be constructed
    #[error("Uploader unavailable: {0}")]
    UploaderUnavailable(UploadError),

    /// Another sync pass holds the guard
    #[error("Sync pass already in progress")]
    AlreadyInProgress,
}

impl QueueError {
    /// Create a new storage unavailable error
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable(message.into())
    }

    /// Whether the caller should simply try again later
    pub fn is_retry_later(&self) -> bool {
        matches!(self, Self::AlreadyInProgress)
    }
}

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;
