//! Database Schema Definitions
//!
//! Contains the queue schema and its migrations.

/// Current database schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Bookkeeping table for applied migrations
pub const CREATE_MIGRATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
)";

/// Migration 1: pending report queue and sync metadata
const MIGRATION_1: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pending_reports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_ref TEXT NOT NULL UNIQUE,
        location TEXT NOT NULL,
        issue_type TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        contact TEXT NOT NULL DEFAULT '',
        enqueued_at TEXT NOT NULL,
        synced INTEGER NOT NULL DEFAULT 0,
        attempts INTEGER NOT NULL DEFAULT 0,
        last_attempt TEXT,
        last_error TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_pending_reports_enqueued_at
        ON pending_reports (enqueued_at, id)",
    "CREATE TABLE IF NOT EXISTS sync_metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
];

/// Schema migrations, in application order
pub const MIGRATIONS: &[(i32, &[&str])] = &[(1, MIGRATION_1)];

/// Check if database needs migration
pub fn needs_migration(current_version: i32) -> bool {
    current_version < CURRENT_SCHEMA_VERSION
}

/// Get pending migrations
pub fn get_pending_migrations(current_version: i32) -> Vec<(i32, &'static [&'static str])> {
    MIGRATIONS
        .iter()
        .filter(|(version, _)| *version > current_version)
        .cloned()
        .collect()
}
