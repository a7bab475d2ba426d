use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::Holding;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_invested: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_percent: f64,
    pub holdings_count: usize,
    pub top_performers: Vec<Holding>,
    pub worst_performers: Vec<Holding>,
}

/// Approximate gain of one SELL against the mean price of earlier BUYs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedTrade {
    pub transaction_id: Uuid,
    pub symbol: String,
    pub quantity: f64,
    pub sell_price: f64,
    pub average_buy_price: f64,
    pub realized_gain: f64,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub total_return_percent: f64,
    pub realized_gains: f64,
    pub unrealized_gains: f64,
    pub total_dividends: f64,
    pub best_trade: Option<RealizedTrade>,
    pub worst_trade: Option<RealizedTrade>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
