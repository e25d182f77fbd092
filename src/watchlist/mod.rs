pub mod service;
pub mod types;

pub use service::WatchlistService;
pub use types::{Stock, Watchlist, WatchlistOverview};
