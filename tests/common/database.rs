//! Queue database fixtures
//!
//! Each fixture owns a temporary directory holding its SQLite file, removed
//! when the fixture is dropped.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use water_report_sync::local_db::LocalDatabase;
use water_report_sync::offline::{ConnectivityMonitor, ReportQueue};
use water_report_sync::sync::ReportUploader;

/// Temporary queue database
pub struct TestDatabase {
    dir: TempDir,
    db: Arc<LocalDatabase>,
}

impl TestDatabase {
    /// Create and open a fresh database
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = LocalDatabase::open(dir.path().join("queue.db"))
            .await
            .expect("Failed to open test database");
        Self {
            dir,
            db: Arc::new(db),
        }
    }

    pub fn db(&self) -> Arc<LocalDatabase> {
        Arc::clone(&self.db)
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("queue.db")
    }

    /// Build a queue over this database
    pub fn queue(&self, online: bool, uploader: Arc<dyn ReportUploader>) -> ReportQueue {
        ReportQueue::new(self.db(), ConnectivityMonitor::new(online), uploader)
    }
}
