//! # Offline Report Queue
//!
//! Offline-first submission of water issue reports. A report submitted while
//! disconnected is stored locally and delivered once connectivity returns.
//!
//! ## Architecture
//!
//! - **Connectivity**: online/offline state and transition events
//! - **Intake**: send-now-or-queue decision for new submissions
//! - **Sync engine** (`crate::sync`): drains the queue against the server
//! - **Local database** (`crate::local_db`): durable queue storage
//!
//! `ReportQueue` owns all of them and is the handle a UI holds.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use water_report_sync::config::Config;
//! use water_report_sync::offline::ReportQueue;
//! use water_report_sync::shared::ReportInput;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = ReportQueue::open(&Config::new(), false).await?;
//! let _reconnect = queue.spawn_reconnect_sync();
//!
//! queue.submit(&ReportInput::new("Lalung village", "contamination")).await?;
//! println!("{} reports waiting", queue.pending_count().await?);
//!
//! // Host reports the network is back; the queued report is synced
//! queue.set_online(true);
//! # Ok(())
//! # }
//! ```

pub mod connectivity;
pub mod intake;

pub use connectivity::{ConnectivityEvent, ConnectivityMonitor};
pub use intake::{ReportIntake, SubmitOutcome};

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{QueueError, Result};
use crate::local_db::{DatabaseStats, LocalDatabase};
use crate::shared::{PendingReport, ReportInput};
use crate::sync::upload::{HttpUploader, ReportUploader};
use crate::sync::{SyncEngine, SyncEvent, SyncState, SyncSummary};

/// Handle owning the queue store, connectivity state, intake and sync engine
#[derive(Clone)]
pub struct ReportQueue {
    db: Arc<LocalDatabase>,
    connectivity: ConnectivityMonitor,
    intake: ReportIntake,
    engine: SyncEngine,
}

impl ReportQueue {
    /// Assemble a queue from its parts
    pub fn new(
        db: Arc<LocalDatabase>,
        connectivity: ConnectivityMonitor,
        uploader: Arc<dyn ReportUploader>,
    ) -> Self {
        Self::with_capacity(db, connectivity, uploader, crate::shared::config::DEFAULT_EVENT_CAPACITY)
    }

    fn with_capacity(
        db: Arc<LocalDatabase>,
        connectivity: ConnectivityMonitor,
        uploader: Arc<dyn ReportUploader>,
        capacity: usize,
    ) -> Self {
        let intake = ReportIntake::new(Arc::clone(&db), connectivity.clone(), Arc::clone(&uploader));
        let engine = SyncEngine::with_capacity(Arc::clone(&db), uploader, capacity);
        Self {
            db,
            connectivity,
            intake,
            engine,
        }
    }

    /// Open the configured database and use the HTTP uploader
    pub async fn open(config: &Config, online: bool) -> Result<Self> {
        let db = Arc::new(LocalDatabase::from_config(config));
        db.initialize().await?;

        let uploader = HttpUploader::from_config(config).map_err(QueueError::UploaderUnavailable)?;
        let connectivity = ConnectivityMonitor::with_capacity(online, config.event_capacity());

        Ok(Self::with_capacity(
            db,
            connectivity,
            Arc::new(uploader),
            config.event_capacity(),
        ))
    }

    /// Submit a report
    pub async fn submit(&self, input: &ReportInput) -> Result<SubmitOutcome> {
        self.intake.submit(input).await
    }

    /// Run one sync pass now
    pub async fn run_sync_pass(&self) -> Result<SyncSummary> {
        self.engine.run_sync_pass().await
    }

    /// Reports waiting for upload, oldest first
    pub async fn list_pending(&self) -> Result<Vec<PendingReport>> {
        self.db.list_all().await
    }

    /// Number of reports waiting for upload
    pub async fn pending_count(&self) -> Result<u64> {
        self.db.pending_count().await
    }

    pub async fn stats(&self) -> Result<DatabaseStats> {
        self.db.get_stats().await
    }

    /// Feed the host's connectivity signal
    pub fn set_online(&self, online: bool) -> Option<ConnectivityEvent> {
        self.connectivity.set_online(online)
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub fn sync_state(&self) -> SyncState {
        self.engine.state()
    }

    pub fn subscribe_sync_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.engine.subscribe()
    }

    pub fn subscribe_connectivity(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.connectivity.subscribe()
    }

    pub fn database(&self) -> &Arc<LocalDatabase> {
        &self.db
    }

    /// Sync automatically whenever connectivity returns
    ///
    /// If already online, one recovery pass runs first for reports left over
    /// from a previous session. The task ends when the returned handle is
    /// aborted.
    pub fn spawn_reconnect_sync(&self) -> JoinHandle<()> {
        let mut transitions = self.connectivity.subscribe();
        let queue = self.clone();

        tokio::spawn(async move {
            if queue.is_online() {
                queue.sync_after("startup").await;
            }

            loop {
                match transitions.recv().await {
                    Ok(ConnectivityEvent::BecameOnline) => queue.sync_after("reconnect").await,
                    Ok(ConnectivityEvent::BecameOffline) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("[Sync] Missed {} connectivity events", skipped);
                        if queue.is_online() {
                            queue.sync_after("reconnect").await;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    async fn sync_after(&self, reason: &str) {
        loop {
            match self.engine.run_sync_pass().await {
                Ok(summary) if summary.attempted > 0 => {
                    tracing::info!(
                        "[Sync] {} sync delivered {}/{} reports",
                        reason,
                        summary.succeeded,
                        summary.attempted
                    );
                }
                Ok(_) => {}
                Err(e) if e.is_retry_later() => {
                    // The running pass may have snapshotted before the trigger,
                    // so run again once it ends
                    tracing::debug!("[Sync] {} sync waiting for the running pass", reason);
                    self.engine.wait_until_idle().await;
                    if self.is_online() {
                        continue;
                    }
                    tracing::debug!("[Sync] {} sync dropped, offline again", reason);
                }
                Err(e) => {
                    tracing::error!("[Sync] {} sync failed: {}", reason, e);
                }
            }
            return;
        }
    }
}
