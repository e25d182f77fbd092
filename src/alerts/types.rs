//! Wire types for the alert push channel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One server-pushed alert event, JSON-encoded on the wire with camelCase
/// field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub severity: String,
    pub timestamp: DateTime<Utc>,
    pub trigger_price: f64,
    pub current_price: f64,
}

/// Explicit authenticate message sent once on connection open.
///
/// The token also travels as a query parameter; sending it in-band as well
/// covers transports that drop query strings.
#[derive(Debug, Serialize)]
pub struct AuthenticateMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    token: String,
}

impl AuthenticateMessage {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            kind: "authenticate",
            token: token.into(),
        }
    }
}

/// Connection state surfaced to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Reconnecting => write!(f, "reconnecting"),
        }
    }
}
