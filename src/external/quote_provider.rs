use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Latest quote for one symbol, the sole source of "current price".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: Option<String>,
    pub close: f64,
    pub change: f64,
    pub percent_change: f64,
    pub volume: Option<String>,
    pub market_cap: Option<f64>,
    pub datetime: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited by quote provider")]
    RateLimited,

    #[error("Invalid stock symbol or no data available")]
    InvalidSymbol,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError>;
}
