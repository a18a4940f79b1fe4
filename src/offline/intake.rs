//! # Report Intake
//!
//! Accepts a user submission and decides its fate: sent right away when
//! online, otherwise written to the local queue.
//!
//! Every accepted submission ends either confirmed by the server or stored
//! locally. Invalid input is rejected before anything is stored or sent.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{QueueError, Result};
use crate::local_db::LocalDatabase;
use crate::offline::connectivity::ConnectivityMonitor;
use crate::shared::{ReportInput, ReportPayload};
use crate::sync::upload::ReportUploader;

/// Where a submission ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// The server confirmed the report
    SentImmediately,
    /// The report is stored locally under `id`
    Queued { id: i64 },
}

/// Report intake
#[derive(Clone)]
pub struct ReportIntake {
    db: Arc<LocalDatabase>,
    connectivity: ConnectivityMonitor,
    uploader: Arc<dyn ReportUploader>,
}

impl ReportIntake {
    pub fn new(
        db: Arc<LocalDatabase>,
        connectivity: ConnectivityMonitor,
        uploader: Arc<dyn ReportUploader>,
    ) -> Self {
        Self {
            db,
            connectivity,
            uploader,
        }
    }

    /// Submit a report
    ///
    /// When online, makes a single upload attempt. A transient failure falls
    /// back to the queue; a permanent rejection is returned as
    /// `QueueError::Rejected` without queueing.
    pub async fn submit(&self, input: &ReportInput) -> Result<SubmitOutcome> {
        let report = input.normalized();
        report.validate()?;

        let client_ref = Uuid::new_v4();

        if self.connectivity.is_online() {
            let payload = ReportPayload::from_input(&report, client_ref);
            match self.uploader.upload(&payload).await {
                Ok(()) => {
                    tracing::info!("[Intake] Report {} sent immediately", client_ref);
                    return Ok(SubmitOutcome::SentImmediately);
                }
                Err(e) if e.is_permanent() => {
                    tracing::warn!("[Intake] Report {} rejected by server: {}", client_ref, e);
                    return Err(QueueError::Rejected(e));
                }
                Err(e) => {
                    tracing::warn!("[Intake] Immediate send failed, queueing: {}", e);
                }
            }
        } else {
            tracing::debug!("[Intake] Offline, queueing report {}", client_ref);
        }

        let id = self.db.insert_with_ref(&report, client_ref).await?;
        tracing::info!("[Intake] Report queued as {}", id);
        Ok(SubmitOutcome::Queued { id })
    }
}
