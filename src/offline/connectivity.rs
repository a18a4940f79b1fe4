//! # Connectivity Monitor
//!
//! Tracks whether the device is online and announces each transition.
//!
//! The host environment feeds its own connectivity signal into
//! `set_online`. Reads are level-triggered (`is_online` returns the latest
//! state); the event stream is edge-triggered, so repeating the same signal
//! produces no event.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use water_report_sync::offline::connectivity::{ConnectivityEvent, ConnectivityMonitor};
//!
//! # async fn example() {
//! let monitor = ConnectivityMonitor::new(false);
//! let mut events = monitor.subscribe();
//!
//! monitor.set_online(true);
//! assert_eq!(events.recv().await.ok(), Some(ConnectivityEvent::BecameOnline));
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use crate::shared::config::DEFAULT_EVENT_CAPACITY;

/// Online/offline transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityEvent {
    BecameOnline,
    BecameOffline,
}

/// Shared online/offline state with transition notifications
///
/// Cloning yields another handle to the same state.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    status: Arc<watch::Sender<bool>>,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the given initial state
    pub fn new(online: bool) -> Self {
        Self::with_capacity(online, DEFAULT_EVENT_CAPACITY)
    }

    /// Create a monitor with a specific event buffer size
    pub fn with_capacity(online: bool, capacity: usize) -> Self {
        let (status, _) = watch::channel(online);
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            status: Arc::new(status),
            events,
        }
    }

    /// Current connectivity snapshot
    pub fn is_online(&self) -> bool {
        *self.status.borrow()
    }

    /// Feed the host's connectivity signal
    ///
    /// Returns the transition raised, or `None` if the state did not change.
    pub fn set_online(&self, online: bool) -> Option<ConnectivityEvent> {
        let changed = self.status.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if !changed {
            tracing::debug!("[Network] Ignoring repeated {} signal", label(online));
            return None;
        }

        let event = if online {
            tracing::info!("[Network] Connection restored");
            ConnectivityEvent::BecameOnline
        } else {
            tracing::warn!("[Network] Connection lost");
            ConnectivityEvent::BecameOffline
        };

        // No subscribers is fine
        let _ = self.events.send(event);
        Some(event)
    }

    /// Subscribe to transition events
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    /// Resolve once the monitor reports online
    pub async fn wait_until_online(&self) {
        let mut status = self.status.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = status.wait_for(|online| *online).await;
    }
}

impl Default for ConnectivityMonitor {
    /// Assume online until the host says otherwise
    fn default() -> Self {
        Self::new(true)
    }
}

fn label(online: bool) -> &'static str {
    if online {
        "online"
    } else {
        "offline"
    }
}
