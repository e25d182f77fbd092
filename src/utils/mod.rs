//! Utility modules for cross-cutting concerns

pub mod backoff;
pub mod error;

// Re-export commonly used items
pub use backoff::ReconnectBackoff;
pub use error::StockdeckError;
