use std::sync::Arc;

use tracing::debug;

use crate::external::quote_provider::{Quote, QuoteError, QuoteProvider};
use crate::services::quote_cache::QuoteCache;

/// Cache-first access to the quote provider. No retries: a failed fetch is
/// returned to the caller and nothing is cached.
#[derive(Clone)]
pub struct QuoteService {
    provider: Arc<dyn QuoteProvider>,
    cache: QuoteCache,
}

impl QuoteService {
    pub fn new(provider: Arc<dyn QuoteProvider>, cache: QuoteCache) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    pub async fn quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let symbol = symbol.trim().to_uppercase();

        if let Some(quote) = self.cache.get(&symbol) {
            debug!("Quote cache hit for {}", symbol);
            return Ok(quote);
        }

        let quote = self.provider.fetch_quote(&symbol).await?;
        self.cache.insert(&symbol, quote.clone());
        Ok(quote)
    }

    /// Latest close, or `None` when the provider fails.
    pub async fn current_price(&self, symbol: &str) -> Option<f64> {
        match self.quote(symbol).await {
            Ok(quote) => Some(quote.close),
            Err(e) => {
                tracing::warn!("Error fetching current price for {}: {}", symbol, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteProvider for CountingProvider {
        async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol == "BAD" {
                return Err(QuoteError::InvalidSymbol);
            }
            Ok(Quote {
                symbol: symbol.to_string(),
                name: None,
                close: 10.0,
                change: 0.0,
                percent_change: 0.0,
                volume: None,
                market_cap: None,
                datetime: None,
            })
        }
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let provider = Arc::new(CountingProvider { calls: AtomicUsize::new(0) });
        let service = QuoteService::new(provider.clone(), QuoteCache::new(Duration::seconds(300)));

        service.quote("aapl").await.unwrap();
        service.quote("AAPL").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let provider = Arc::new(CountingProvider { calls: AtomicUsize::new(0) });
        let service = QuoteService::new(provider.clone(), QuoteCache::new(Duration::seconds(300)));

        assert_eq!(service.quote("BAD").await, Err(QuoteError::InvalidSymbol));
        assert_eq!(service.current_price("BAD").await, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(service.cache().is_empty());
    }
}
