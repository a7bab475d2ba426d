use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::external::quote_provider::{Quote, QuoteError, QuoteProvider};

pub struct TwelveDataProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TwelveDataProvider {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

// Twelve Data sends numbers as strings and reports errors in-band with a 200.
#[derive(Debug, Default, Deserialize)]
struct TwelveDataQuoteResponse {
    symbol: Option<String>,
    name: Option<String>,
    close: Option<String>,
    change: Option<String>,
    percent_change: Option<String>,
    volume: Option<String>,
    market_cap: Option<Value>,
    datetime: Option<String>,

    // Error handling
    status: Option<String>,
    code: Option<u32>,
    message: Option<String>,
}

fn parse_quote(requested: &str, body: TwelveDataQuoteResponse) -> Result<Quote, QuoteError> {
    if body.status.as_deref() == Some("error") {
        let msg = body.message.unwrap_or_default();
        if body.code == Some(429) || msg.contains("API rate limit") || msg.contains("credits") {
            return Err(QuoteError::RateLimited);
        }
    }

    let close = body
        .close
        .filter(|c| !c.trim().is_empty())
        .ok_or(QuoteError::InvalidSymbol)?
        .trim()
        .parse::<f64>()
        .map_err(|e| QuoteError::Parse(format!("close: {}", e)))?;

    Ok(Quote {
        symbol: body.symbol.unwrap_or_else(|| requested.to_string()),
        name: body.name,
        close,
        change: parse_lenient(body.change.as_deref()),
        percent_change: parse_lenient(body.percent_change.as_deref()),
        volume: body.volume,
        market_cap: body.market_cap.as_ref().and_then(number_from_value),
        datetime: body.datetime,
    })
}

/// Missing or unparsable movement fields count as no movement.
fn parse_lenient(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl QuoteProvider for TwelveDataProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let url = format!("{}/quote", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(QuoteError::BadResponse(format!("HTTP {}", resp.status())));
        }

        let body: TwelveDataQuoteResponse = resp
            .json()
            .await
            .map_err(|e| QuoteError::Parse(e.to_string()))?;

        parse_quote(symbol, body)
    }
}
