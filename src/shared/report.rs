/**
 * Water Issue Report Types
 *
 * This module defines the report a user submits, the record kept in the
 * local queue while it waits to be delivered, and the payload handed to
 * the upload collaborator.
 *
 * Field contents are opaque to the queue. Only `location` and `issue_type`
 * are required to be non-empty.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// A report as submitted by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportInput {
    /// Where the issue was observed (village, street, landmark)
    pub location: String,
    /// Kind of issue, e.g. "leak" or "contamination"
    pub issue_type: String,
    /// Free-form description
    pub description: String,
    /// How to reach the reporter, may be empty
    pub contact: String,
}

impl ReportInput {
    /// Create a report with the two required fields set
    pub fn new(location: impl Into<String>, issue_type: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            issue_type: issue_type.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    /// Trim surrounding whitespace from every field
    pub fn normalized(&self) -> Self {
        Self {
            location: self.location.trim().to_string(),
            issue_type: self.issue_type.trim().to_string(),
            description: self.description.trim().to_string(),
            contact: self.contact.trim().to_string(),
        }
    }

    /// Check required fields
    ///
    /// Whitespace-only values count as empty.
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.location.trim().is_empty() {
            return Err(SharedError::validation("location", "location is required"));
        }
        if self.issue_type.trim().is_empty() {
            return Err(SharedError::validation("issue_type", "issue type is required"));
        }
        Ok(())
    }
}

/// A report waiting in the local queue
///
/// Exists in the store exactly as long as the server has not confirmed it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingReport {
    /// Store-assigned id, never reused
    pub id: i64,
    /// Idempotency key sent with every upload attempt
    pub client_ref: Uuid,
    pub location: String,
    pub issue_type: String,
    pub description: String,
    pub contact: String,
    /// Insertion time, determines sync order
    pub enqueued_at: DateTime<Utc>,
    /// Always false while queued
    pub synced: bool,
    /// Number of failed upload attempts
    pub attempts: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl PendingReport {
    /// Build the upload payload for this record
    pub fn payload(&self) -> ReportPayload {
        ReportPayload {
            client_ref: self.client_ref,
            location: self.location.clone(),
            issue_type: self.issue_type.clone(),
            description: self.description.clone(),
            contact: self.contact.clone(),
            reported_at: self.enqueued_at,
        }
    }
}

/// Body sent to the server for a single report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub client_ref: Uuid,
    pub location: String,
    pub issue_type: String,
    pub description: String,
    pub contact: String,
    pub reported_at: DateTime<Utc>,
}

impl ReportPayload {
    /// Payload for a report that is sent without being queued first
    pub fn from_input(input: &ReportInput, client_ref: Uuid) -> Self {
        Self {
            client_ref,
            location: input.location.clone(),
            issue_type: input.issue_type.clone(),
            description: input.description.clone(),
            contact: input.contact.clone(),
            reported_at: Utc::now(),
        }
    }
}
