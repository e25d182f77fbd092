//! stockdeck: client core for a stock-watchlist dashboard
//!
//! All business logic (quotes, dividends, persistence, authentication) lives
//! behind an external REST API and an alert push channel. This crate is the
//! state-binding layer over those services:
//!
//! - [`auth`]: REST authentication and the token/session store
//! - [`session`]: idle and absolute timeout enforcement on the session
//! - [`alerts`]: the live alert feed and its auto-reconnecting stream client
//! - [`watchlist`]: watchlist CRUD and market-data overviews
//! - [`api`]: shared REST transport with bearer-token injection
//! - [`config`]: layered configuration (file, environment)

pub mod alerts;
pub mod api;
pub mod auth;
pub mod config;
pub mod session;
pub mod utils;
pub mod watchlist;
