//! In-memory alert feed shared between the stream task and the UI
//!
//! Events are held newest-first. A malformed payload is dropped with a
//! warning and never disturbs the list; one bad message must not take the
//! feed down.

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::alerts::types::{AlertEvent, ConnectionStatus};

#[derive(Debug)]
pub struct AlertFeed {
    alerts: RwLock<Vec<AlertEvent>>,
    status: RwLock<ConnectionStatus>,
}

impl AlertFeed {
    pub fn new() -> Self {
        Self {
            alerts: RwLock::new(Vec::new()),
            status: RwLock::new(ConnectionStatus::Disconnected),
        }
    }

    /// Parses an inbound payload and prepends it to the feed.
    ///
    /// Returns the event on success; a parse failure is logged and dropped.
    pub async fn ingest(&self, text: &str) -> Option<AlertEvent> {
        match serde_json::from_str::<AlertEvent>(text) {
            Ok(event) => {
                debug!(symbol = %event.symbol, severity = %event.severity, "Alert received");
                let mut alerts = self.alerts.write().await;
                alerts.insert(0, event.clone());
                Some(event)
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed alert payload");
                None
            }
        }
    }

    /// Snapshot of all alerts, newest first
    pub async fn snapshot(&self) -> Vec<AlertEvent> {
        self.alerts.read().await.clone()
    }

    /// Most recent alert, if any
    pub async fn latest(&self) -> Option<AlertEvent> {
        self.alerts.read().await.first().cloned()
    }

    pub async fn len(&self) -> usize {
        self.alerts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.alerts.read().await.is_empty()
    }

    pub async fn status(&self) -> ConnectionStatus {
        *self.status.read().await
    }

    pub async fn set_status(&self, status: ConnectionStatus) {
        let mut current = self.status.write().await;
        if *current != status {
            info!(from = %current, to = %status, "Alert stream status changed");
            *current = status;
        }
    }
}

impl Default for AlertFeed {
    fn default() -> Self {
        Self::new()
    }
}
