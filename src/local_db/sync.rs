//! # Sync Metadata Operations
//!
//! Key/value bookkeeping about synchronization, currently the time the last
//! sync pass finished.

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::error::Result;
use crate::local_db::pending_reports::{decode_timestamp, encode_timestamp};
use crate::local_db::LocalDatabase;

/// Metadata key for the last completed sync pass
pub const LAST_SYNC_TIME_KEY: &str = "last_sync_time";

impl LocalDatabase {
    /// Set sync metadata
    pub async fn set_sync_metadata(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO sync_metadata (key, value, updated_at)
             VALUES (?, ?, ?)",
        )
        .bind(key)
        .bind(value)
        .bind(encode_timestamp(Utc::now()))
        .execute(self.pool().await?)
        .await?;
        Ok(())
    }

    /// Get sync metadata
    pub async fn get_sync_metadata(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM sync_metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool().await?)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    /// Get last sync timestamp
    pub async fn last_sync_time(&self) -> Result<Option<DateTime<Utc>>> {
        match self.get_sync_metadata(LAST_SYNC_TIME_KEY).await? {
            Some(value) => Ok(Some(decode_timestamp(&value)?)),
            None => Ok(None),
        }
    }

    /// Set last sync timestamp
    pub async fn set_last_sync_time(&self) -> Result<()> {
        self.set_sync_metadata(LAST_SYNC_TIME_KEY, &encode_timestamp(Utc::now()))
            .await
    }
}
