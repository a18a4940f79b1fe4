//! # Pending Report Operations
//!
//! Insert, ordered listing, and removal of reports waiting for upload.
//!
//! Records are listed oldest first by `enqueued_at`, ties broken by `id`.
//! Timestamps are stored as fixed-width RFC 3339 text so that string order is
//! time order.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::error::Result;
use crate::local_db::LocalDatabase;
use crate::shared::{PendingReport, ReportInput};

const SELECT_COLUMNS: &str = "id, client_ref, location, issue_type, description, contact,
    enqueued_at, synced, attempts, last_attempt, last_error";

/// Format a timestamp for storage
pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub(crate) fn decode_timestamp(value: &str) -> sqlx::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn row_to_report(row: &SqliteRow) -> sqlx::Result<PendingReport> {
    let client_ref: String = row.try_get("client_ref")?;
    let enqueued_at: String = row.try_get("enqueued_at")?;
    let last_attempt: Option<String> = row.try_get("last_attempt")?;
    let attempts: i64 = row.try_get("attempts")?;

    Ok(PendingReport {
        id: row.try_get("id")?,
        client_ref: Uuid::parse_str(&client_ref).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        location: row.try_get("location")?,
        issue_type: row.try_get("issue_type")?,
        description: row.try_get("description")?,
        contact: row.try_get("contact")?,
        enqueued_at: decode_timestamp(&enqueued_at)?,
        synced: row.try_get("synced")?,
        attempts: attempts.max(0) as u32,
        last_attempt: last_attempt.as_deref().map(decode_timestamp).transpose()?,
        last_error: row.try_get("last_error")?,
    })
}

impl LocalDatabase {
    /// Add a report to the queue with a fresh idempotency key
    pub async fn insert(&self, record: &ReportInput) -> Result<i64> {
        self.insert_with_ref(record, Uuid::new_v4()).await
    }

    /// Add a report to the queue under an existing idempotency key
    ///
    /// Used when an immediate send failed, so the server sees the same key on
    /// the retry.
    pub async fn insert_with_ref(&self, record: &ReportInput, client_ref: Uuid) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO pending_reports
                (client_ref, location, issue_type, description, contact, enqueued_at, synced, attempts)
             VALUES (?, ?, ?, ?, ?, ?, 0, 0)",
        )
        .bind(client_ref.to_string())
        .bind(&record.location)
        .bind(&record.issue_type)
        .bind(&record.description)
        .bind(&record.contact)
        .bind(encode_timestamp(Utc::now()))
        .execute(self.pool().await?)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!("[Store] Queued report {} ({})", id, client_ref);
        Ok(id)
    }

    /// All queued reports, oldest first
    pub async fn list_all(&self) -> Result<Vec<PendingReport>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM pending_reports ORDER BY enqueued_at ASC, id ASC",
            SELECT_COLUMNS
        ))
        .fetch_all(self.pool().await?)
        .await?;

        let reports = rows
            .iter()
            .map(row_to_report)
            .collect::<sqlx::Result<Vec<_>>>()?;
        Ok(reports)
    }

    /// Fetch a single queued report
    pub async fn get(&self, id: i64) -> Result<Option<PendingReport>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM pending_reports WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool().await?)
        .await?;

        Ok(row.as_ref().map(row_to_report).transpose()?)
    }

    /// Delete a report
    ///
    /// Deleting an id that is already gone is not an error.
    pub async fn remove(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM pending_reports WHERE id = ?")
            .bind(id)
            .execute(self.pool().await?)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("[Store] Report {} already removed", id);
        }
        Ok(())
    }

    /// Number of queued reports
    pub async fn pending_count(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_reports")
            .fetch_one(self.pool().await?)
            .await?;
        Ok(count.0 as u64)
    }

    /// Record a failed upload attempt
    pub async fn record_failure(&self, id: i64, error_message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE pending_reports SET
                attempts = attempts + 1,
                last_attempt = ?,
                last_error = ?
             WHERE id = ?",
        )
        .bind(encode_timestamp(Utc::now()))
        .bind(error_message)
        .bind(id)
        .execute(self.pool().await?)
        .await?;
        Ok(())
    }
}
