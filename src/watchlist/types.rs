//! Wire types for watchlists and market data
//!
//! Shapes mirror the REST API responses; camelCase where the server sends
//! camelCase, snake_case where it doesn't (`created_at`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    pub id: i64,
    pub name: String,
    pub user: i64,
    pub created_at: String,
}

/// A configured price alert attached to a stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredAlert {
    pub id: i64,
    pub stock: i64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub severity: String,
    pub timestamp: String,
    pub trigger_price: f64,
    pub triggered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    #[serde(default)]
    pub alerts: Vec<ConfiguredAlert>,
    pub pinned: bool,
    pub sector: String,
    #[serde(default)]
    pub market_cap: Option<f64>,
    pub shares: f64,
    pub avg_price: f64,
    #[serde(default)]
    pub chart_data: Vec<HistoricalData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalData {
    pub date: i64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendInfo {
    pub payment_date: String,
    pub amount: f64,
    #[serde(rename = "yield")]
    pub dividend_yield: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOverview {
    pub symbol: String,
    pub historical_data: Vec<HistoricalData>,
    pub most_recent_dividend: DividendInfo,
}

/// Portfolio-level summary across every watched stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistOverview {
    pub overall_total_value: f64,
    pub overall_total_gain_loss: f64,
    pub stocks: Vec<StockOverview>,
}
