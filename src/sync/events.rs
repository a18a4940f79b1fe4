//! # Sync Events
//!
//! Notifications published while a sync pass runs. Observers (a progress
//! bar, a pending badge) subscribe through `SyncEngine::subscribe`; the pass
//! itself never waits on them.

use serde::{Deserialize, Serialize};

/// Aggregate result of one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Records in the snapshot taken at pass start
    pub attempted: usize,
    /// Records the server confirmed and that were removed
    pub succeeded: usize,
    /// Records still queued after the pass, including delivered ones whose
    /// removal failed
    pub failed: usize,
}

impl SyncSummary {
    /// Every attempted record was delivered
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// What happened to one record during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordOutcome {
    /// Server confirmed, record removed
    Uploaded,
    /// Upload failed, record kept
    Failed {
        error: String,
        /// Server refused the payload itself
        permanent: bool,
    },
    /// Server confirmed but the record could not be removed. It is sent
    /// again next pass under the same idempotency key.
    NotRemoved { error: String },
}

/// Progress after each processed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub report_id: i64,
    /// Records processed so far, including this one
    pub processed: usize,
    /// Size of the pass snapshot
    pub attempted: usize,
    pub outcome: RecordOutcome,
}

impl SyncProgress {
    /// Fraction of the pass completed, in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.attempted == 0 {
            1.0
        } else {
            self.processed as f64 / self.attempted as f64
        }
    }
}

/// Event published by the sync engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncEvent {
    /// A pass took its snapshot
    Started { attempted: usize },
    /// One record was processed
    Progress(SyncProgress),
    /// The pass finished
    Finished(SyncSummary),
}
