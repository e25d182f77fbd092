//! Watchlist CRUD and market-data overview calls
//!
//! Thin service layer over the REST API; paths are wire-faithful to the
//! backend routes, including the `add/` collection route used for both
//! create and list.

use serde_json::json;
use tracing::info;

use crate::api::{ApiClient, ApiError};
use crate::watchlist::types::{Stock, Watchlist, WatchlistOverview};

pub struct WatchlistService {
    api: ApiClient,
}

impl WatchlistService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create(&self, name: impl Into<String>) -> Result<Watchlist, ApiError> {
        let name = name.into();
        let watchlist: Watchlist = self
            .api
            .post("/watchlists/add/", &json!({ "name": name }))
            .await?;
        info!(id = watchlist.id, name = %watchlist.name, "Created watchlist");
        Ok(watchlist)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api
            .delete(&format!("/watchlists/{}/destroy/", id))
            .await?;
        info!(id = id, "Deleted watchlist");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Watchlist>, ApiError> {
        self.api.get("/watchlists/add/").await
    }

    /// Stocks in one watchlist with current prices
    pub async fn stocks(&self, watchlist_id: i64) -> Result<Vec<Stock>, ApiError> {
        self.api
            .get(&format!("/watchlists/{}/overview/", watchlist_id))
            .await
    }

    /// Portfolio-wide summary: totals plus per-stock history and dividends
    pub async fn portfolio_overview(&self) -> Result<WatchlistOverview, ApiError> {
        self.api.get("/watchlist/overview/").await
    }
}
