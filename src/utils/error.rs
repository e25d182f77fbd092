//! Centralized error types and conversions for stockdeck
//!
//! This module provides structured error types using `thiserror` for library code.
//! CLI/main modules should use `anyhow` for easy context.

use std::path::PathBuf;
use thiserror::Error;

/// Global error type for stockdeck operations
#[derive(Error, Debug)]
pub enum StockdeckError {
    /// IO errors with path context
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Authentication/session errors
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// REST API errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Alert stream errors
    #[error("Alert stream error: {message}")]
    Stream { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Channel/communication errors
    #[error("Channel error: {message}")]
    Channel { message: String },
}

impl StockdeckError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an API error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create an alert stream error
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a channel error
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
        }
    }

    /// Returns true if this error is recoverable (system can continue)
    ///
    /// Anything that threatens session validity fails closed; anything that
    /// threatens a single data point or a single connection can be retried.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Transient network/IO failures can be retried
            StockdeckError::Io { .. } => true,
            StockdeckError::Api { .. } => true,
            StockdeckError::Stream { .. } => true,
            StockdeckError::Channel { .. } => true,
            // Auth failures terminate the session
            StockdeckError::Auth { .. } => false,
            // Config errors are fatal on startup
            StockdeckError::Config { .. } => false,
            // Serialization errors usually indicate corrupt state
            StockdeckError::Serialization { .. } => false,
        }
    }

    /// Returns the error severity level for logging
    pub fn severity(&self) -> tracing::Level {
        match self {
            StockdeckError::Auth { .. } => tracing::Level::ERROR,
            StockdeckError::Config { .. } => tracing::Level::ERROR,
            StockdeckError::Serialization { .. } => tracing::Level::ERROR,
            StockdeckError::Api { .. } => tracing::Level::WARN,
            StockdeckError::Stream { .. } => tracing::Level::WARN,
            StockdeckError::Io { .. } => tracing::Level::WARN,
            StockdeckError::Channel { .. } => tracing::Level::WARN,
        }
    }
}

/// Result type alias using StockdeckError
pub type Result<T> = std::result::Result<T, StockdeckError>;

// Automatic error conversions for seamless ? operator usage

impl From<std::io::Error> for StockdeckError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for StockdeckError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for StockdeckError {
    fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::Channel {
            message: format!("Failed to send message: {}", err),
        }
    }
}
