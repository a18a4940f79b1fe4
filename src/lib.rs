//! Water Report Sync - Main Library
//!
//! Offline-first queue for water issue reports. A report submitted while the
//! device is offline is stored in a local SQLite database and uploaded once
//! connectivity returns.
//!
//! # Module Structure
//!
//! - **`shared`** - Report model, shared errors, configuration values
//! - **`local_db`** - Durable SQLite queue of pending reports
//! - **`offline`** - Connectivity monitor, report intake, and the `ReportQueue` handle
//! - **`sync`** - Sync engine, upload collaborator, progress events
//! - **`config`** - Configuration loading from the environment and TOML files
//! - **`error`** - Errors returned by queue operations
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use water_report_sync::local_db::LocalDatabase;
//! use water_report_sync::offline::{ConnectivityMonitor, ReportQueue, SubmitOutcome};
//! use water_report_sync::shared::ReportInput;
//! use water_report_sync::sync::HttpUploader;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(LocalDatabase::open("/tmp/reports/queue.db").await?);
//! let uploader = Arc::new(HttpUploader::new(
//!     "https://reports.example.org",
//!     std::time::Duration::from_secs(10),
//! )?);
//! let queue = ReportQueue::new(db, ConnectivityMonitor::new(false), uploader);
//!
//! let report = ReportInput::new("Lalung village", "contamination")
//!     .with_description("Water is discoloured after rain");
//! match queue.submit(&report).await? {
//!     SubmitOutcome::SentImmediately => println!("Delivered"),
//!     SubmitOutcome::Queued { id } => println!("Saved offline as #{}", id),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return `Result<T, QueueError>`. Per-report upload
//! failures during a sync pass are counted in the `SyncSummary` instead of
//! being returned as errors.

/// Shared types and data structures
pub mod shared;

/// Configuration loading
pub mod config;

/// Queue operation errors
pub mod error;

/// Local SQLite queue storage
pub mod local_db;

/// Connectivity, intake, and the queue handle
pub mod offline;

/// Sync engine and upload collaborator
pub mod sync;

pub use error::{QueueError, Result};
pub use offline::{ReportQueue, SubmitOutcome};
pub use shared::{PendingReport, ReportInput};
pub use sync::{SyncEvent, SyncSummary};
