//! # Sync Engine
//!
//! Drains the local report queue against the upload collaborator.
//!
//! ## Pass semantics
//!
//! - A pass snapshots the queue when it starts. Reports queued after that are
//!   left for the next pass, so a pass always terminates.
//! - Records are uploaded one at a time, oldest first.
//! - A confirmed record is removed immediately. A failed one stays queued and
//!   the pass moves on to the next record. A failed removal is handled the
//!   same way, so every pass that starts also finishes.
//! - Only one pass runs at a time. A second call while one is running returns
//!   `QueueError::AlreadyInProgress`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use water_report_sync::local_db::LocalDatabase;
//! use water_report_sync::sync::{HttpUploader, SyncEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(LocalDatabase::open("/tmp/reports/queue.db").await?);
//! let uploader = Arc::new(HttpUploader::new("http://127.0.0.1:3000", Duration::from_secs(10))?);
//! let engine = SyncEngine::new(db, uploader);
//!
//! let summary = engine.run_sync_pass().await?;
//! println!("{} of {} reports delivered", summary.succeeded, summary.attempted);
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{RecordOutcome, SyncEvent, SyncProgress, SyncSummary};
pub use upload::{HttpUploader, ReportUploader, UploadError};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};

use crate::error::{QueueError, Result};
use crate::local_db::LocalDatabase;
use crate::shared::config::DEFAULT_EVENT_CAPACITY;

/// Whether a pass is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Running,
}

/// Releases the running flag when a pass ends, including on error, and
/// wakes tasks waiting for the engine to go idle
struct RunningGuard<'a> {
    flag: &'a AtomicBool,
    idle: &'a Notify,
}

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool, idle: &'a Notify) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag, idle })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.idle.notify_waiters();
    }
}

/// Sync engine for the pending report queue
///
/// Clones share the queue, the uploader, the running flag and the event
/// channel.
#[derive(Clone)]
pub struct SyncEngine {
    db: Arc<LocalDatabase>,
    uploader: Arc<dyn ReportUploader>,
    running: Arc<AtomicBool>,
    idle: Arc<Notify>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(db: Arc<LocalDatabase>, uploader: Arc<dyn ReportUploader>) -> Self {
        Self::with_capacity(db, uploader, DEFAULT_EVENT_CAPACITY)
    }

    /// Create a sync engine with a specific event buffer size
    pub fn with_capacity(
        db: Arc<LocalDatabase>,
        uploader: Arc<dyn ReportUploader>,
        capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            db,
            uploader,
            running: Arc::new(AtomicBool::new(false)),
            idle: Arc::new(Notify::new()),
            events,
        }
    }

    /// Current pass state
    pub fn state(&self) -> SyncState {
        if self.running.load(Ordering::Acquire) {
            SyncState::Running
        } else {
            SyncState::Idle
        }
    }

    /// Resolve once no pass is running
    pub async fn wait_until_idle(&self) {
        let notified = self.idle.notified();
        tokio::pin!(notified);
        // Register before checking so a pass ending in between still wakes us
        notified.as_mut().enable();
        if self.state() == SyncState::Idle {
            return;
        }
        notified.await;
    }

    /// Subscribe to pass events
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Run one sync pass over the reports queued right now
    pub async fn run_sync_pass(&self) -> Result<SyncSummary> {
        let _guard = match RunningGuard::acquire(&self.running, &self.idle) {
            Some(guard) => guard,
            None => {
                tracing::debug!("[Sync] Pass requested while another is running");
                return Err(QueueError::AlreadyInProgress);
            }
        };

        let snapshot = self.db.list_all().await?;
        let attempted = snapshot.len();
        let mut summary = SyncSummary {
            attempted,
            ..Default::default()
        };

        tracing::info!("[Sync] Starting pass over {} queued reports", attempted);
        self.publish(SyncEvent::Started { attempted });

        for (index, report) in snapshot.iter().enumerate() {
            let outcome = match self.uploader.upload(&report.payload()).await {
                Ok(()) => match self.db.remove(report.id).await {
                    Ok(()) => {
                        summary.succeeded += 1;
                        RecordOutcome::Uploaded
                    }
                    Err(e) => {
                        tracing::warn!(
                            "[Sync] Report {} delivered but not removed: {}",
                            report.id,
                            e
                        );
                        summary.failed += 1;
                        RecordOutcome::NotRemoved {
                            error: e.to_string(),
                        }
                    }
                },
                Err(e) => {
                    tracing::warn!("[Sync] Report {} not delivered: {}", report.id, e);
                    if let Err(store_err) = self.db.record_failure(report.id, &e.to_string()).await {
                        tracing::warn!(
                            "[Sync] Could not record failure for report {}: {}",
                            report.id,
                            store_err
                        );
                    }
                    summary.failed += 1;
                    RecordOutcome::Failed {
                        error: e.to_string(),
                        permanent: e.is_permanent(),
                    }
                }
            };

            self.publish(SyncEvent::Progress(SyncProgress {
                report_id: report.id,
                processed: index + 1,
                attempted,
                outcome,
            }));
        }

        if let Err(e) = self.db.set_last_sync_time().await {
            tracing::warn!("[Sync] Could not record sync time: {}", e);
        }

        tracing::info!(
            "[Sync] Pass finished: {} attempted, {} succeeded, {} failed",
            summary.attempted,
            summary.succeeded,
            summary.failed
        );
        self.publish(SyncEvent::Finished(summary));

        Ok(summary)
    }

    fn publish(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
