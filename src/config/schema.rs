use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the dashboard REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// URL of the alert push channel
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Idle timeout: inactivity window after which the session is terminated
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Absolute timeout: hard ceiling on session duration regardless of activity
    #[serde(default = "default_absolute_timeout_secs")]
    pub absolute_timeout_secs: u64,

    /// Initial reconnect delay for the alert stream
    #[serde(default = "default_reconnect_initial_delay_secs")]
    pub reconnect_initial_delay_secs: u64,

    /// Ceiling for the reconnect backoff schedule
    #[serde(default = "default_reconnect_max_delay_secs")]
    pub reconnect_max_delay_secs: u64,

    /// Optional cap on automatic reconnect attempts; absent means retry forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_max_attempts: Option<u32>,

    /// Whether a successful token refresh extends the absolute session ceiling
    #[serde(default)]
    pub extend_absolute_on_refresh: bool,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8000/ws/alerts/".to_string()
}

fn default_idle_timeout_secs() -> u64 {
    5 * 60
}

fn default_absolute_timeout_secs() -> u64 {
    30 * 60
}

fn default_reconnect_initial_delay_secs() -> u64 {
    5
}

fn default_reconnect_max_delay_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ws_url: default_ws_url(),
            idle_timeout_secs: default_idle_timeout_secs(),
            absolute_timeout_secs: default_absolute_timeout_secs(),
            reconnect_initial_delay_secs: default_reconnect_initial_delay_secs(),
            reconnect_max_delay_secs: default_reconnect_max_delay_secs(),
            reconnect_max_attempts: None,
            extend_absolute_on_refresh: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn absolute_timeout(&self) -> Duration {
        Duration::from_secs(self.absolute_timeout_secs)
    }

    pub fn reconnect_initial_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_initial_delay_secs)
    }

    pub fn reconnect_max_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_max_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
