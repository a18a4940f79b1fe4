//! # Local Database Module
//!
//! Durable SQLite storage for reports that have not yet reached the server.
//! The database file is the source of truth: nothing is cached in memory, so a
//! restart loses nothing that was accepted.
//!
//! ## Key Components
//!
//! - `LocalDatabase`: Lazily opened connection pool and schema management
//! - `schema.rs`: Schema definitions and migrations
//! - `pending_reports.rs`: Insert, ordered listing, and removal of queued reports
//! - `sync.rs`: Sync metadata (last completed pass)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use water_report_sync::local_db::LocalDatabase;
//! use water_report_sync::shared::ReportInput;
//!
//! # async fn example() -> water_report_sync::Result<()> {
//! let db = LocalDatabase::new("/tmp/reports/queue.db");
//! db.initialize().await?;
//!
//! let id = db.insert(&ReportInput::new("Lalung village", "leak")).await?;
//! let pending = db.list_all().await?;
//! db.remove(id).await?;
//! # Ok(())
//! # }
//! ```

pub mod schema;
pub mod pending_reports;
pub mod sync;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::error::{QueueError, Result};

/// Maximum pooled connections to the queue file
const MAX_CONNECTIONS: u32 = 4;

/// How long a writer waits on a locked database
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Local database connection manager
///
/// The pool is opened on first use. Concurrent callers of `initialize` share
/// one open attempt and end up with the same pool.
#[derive(Debug)]
pub struct LocalDatabase {
    path: PathBuf,
    pool: OnceCell<SqlitePool>,
}

impl LocalDatabase {
    /// Create a handle for the database at `path` without opening it
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: OnceCell::new(),
        }
    }

    /// Create a handle using the configured database location
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.database_path())
    }

    /// Create a handle and open it immediately
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let db = Self::new(path);
        db.initialize().await?;
        Ok(db)
    }

    /// Open the database and apply the schema
    ///
    /// Idempotent. A failed attempt leaves the handle unopened so a later call
    /// can retry.
    pub async fn initialize(&self) -> Result<()> {
        self.pool().await.map(|_| ())
    }

    /// Whether the pool has been opened
    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }

    /// Database file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get connection pool reference, opening it if needed
    pub(crate) async fn pool(&self) -> Result<&SqlitePool> {
        self.pool.get_or_try_init(|| self.connect()).await
    }

    /// Open the pool and run migrations
    async fn connect(&self) -> Result<SqlitePool> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    QueueError::storage_unavailable(format!(
                        "cannot create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                QueueError::storage_unavailable(format!("cannot open {}: {}", self.path.display(), e))
            })?;

        Self::run_migrations(&pool)
            .await
            .map_err(|e| QueueError::storage_unavailable(format!("schema setup failed: {}", e)))?;

        tracing::info!("[Store] Opened report queue at {}", self.path.display());
        Ok(pool)
    }

    /// Run database migrations
    ///
    /// Checks the current schema version and applies any pending migrations.
    async fn run_migrations(pool: &SqlitePool) -> sqlx::Result<()> {
        sqlx::query(schema::CREATE_MIGRATIONS_TABLE)
            .execute(pool)
            .await?;

        let current_version: (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(pool)
                .await?;

        if !schema::needs_migration(current_version.0) {
            return Ok(());
        }

        for (version, statements) in schema::get_pending_migrations(current_version.0) {
            let mut tx = pool.begin().await?;
            for &statement in statements {
                sqlx::query(statement).execute(&mut *tx).await?;
            }
            sqlx::query("INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(version)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            tracing::debug!("[Store] Applied schema migration {}", version);
        }

        Ok(())
    }

    /// Current schema version recorded in the database
    pub async fn schema_version(&self) -> Result<i32> {
        let version: (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(self.pool().await?)
                .await?;
        Ok(version.0)
    }

    /// Get database statistics
    ///
    /// Returns basic statistics about the queue for debugging.
    pub async fn get_stats(&self) -> Result<DatabaseStats> {
        let (pending_reports, failed_attempts): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(attempts), 0) FROM pending_reports",
        )
        .fetch_one(self.pool().await?)
        .await?;

        let last_sync_time = self.last_sync_time().await?;

        Ok(DatabaseStats {
            pending_reports: pending_reports as u64,
            failed_attempts: failed_attempts as u64,
            last_sync_time,
        })
    }

    /// Close the pool if it was opened
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    /// Reports waiting to be uploaded
    pub pending_reports: u64,
    /// Failed upload attempts across all queued reports
    pub failed_attempts: u64,
    /// When the last sync pass finished
    pub last_sync_time: Option<chrono::DateTime<chrono::Utc>>,
}
