//! Upload stubs for unit tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::{Notify, Semaphore};

use crate::shared::ReportPayload;
use crate::sync::upload::{ReportUploader, UploadError};

/// Records call order by location and fails for chosen locations
pub(crate) struct StubUploader {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    failing_once: Mutex<HashSet<String>>,
    permanent: bool,
    gate: Option<Semaphore>,
    entered: Notify,
}

impl StubUploader {
    fn build(failing: &[&str], permanent: bool, gated: bool) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(failing.iter().map(|s| s.to_string()).collect()),
            failing_once: Mutex::new(HashSet::new()),
            permanent,
            gate: gated.then(|| Semaphore::new(0)),
            entered: Notify::new(),
        }
    }

    pub(crate) fn succeeding() -> Self {
        Self::build(&[], false, false)
    }

    pub(crate) fn failing_for(locations: &[&str]) -> Self {
        Self::build(locations, false, false)
    }

    pub(crate) fn rejecting_for(locations: &[&str]) -> Self {
        Self::build(locations, true, false)
    }

    /// Every upload blocks until `open_gate` is called
    pub(crate) fn gated() -> Self {
        Self::build(&[], false, true)
    }

    /// Gated, and the first upload of each given location fails
    pub(crate) fn gated_failing_once(locations: &[&str]) -> Self {
        let stub = Self::gated();
        stub.failing_once
            .lock()
            .unwrap()
            .extend(locations.iter().map(|s| s.to_string()));
        stub
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Wait until an upload has started
    pub(crate) async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub(crate) fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }
}

#[async_trait]
impl ReportUploader for StubUploader {
    async fn upload(&self, payload: &ReportPayload) -> Result<(), UploadError> {
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.map_err(|e| UploadError::Network(e.to_string()))?;
        }

        self.calls.lock().unwrap().push(payload.location.clone());

        let failed_once = self.failing_once.lock().unwrap().remove(&payload.location);
        if !failed_once && !self.failing.lock().unwrap().contains(&payload.location) {
            return Ok(());
        }
        if self.permanent {
            Err(UploadError::Rejected {
                status: 422,
                message: "malformed report".to_string(),
            })
        } else {
            Err(UploadError::Network("connection refused".to_string()))
        }
    }
}
