//! Quote cache eviction.
//!
//! Reads already ignore stale entries; this job keeps the map from growing
//! with symbols nobody asks for again.

use tracing::info;

use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};

pub async fn evict_expired_quotes(ctx: JobContext) -> Result<JobResult, AppError> {
    let cache = ctx.quotes.cache();
    let removed = cache.cleanup_expired();

    if removed > 0 {
        info!("🧹 Evicted {} expired quotes ({} still cached)", removed, cache.len());
    }

    Ok(JobResult {
        items_processed: i32::try_from(removed).unwrap_or(i32::MAX),
        items_failed: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Duration;

    use crate::external::quote_provider::{Quote, QuoteError, QuoteProvider};
    use crate::services::quote_cache::QuoteCache;
    use crate::services::quote_service::QuoteService;

    struct FixedQuote;

    #[async_trait]
    impl QuoteProvider for FixedQuote {
        async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
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

    fn context(ttl: Duration) -> JobContext {
        JobContext {
            quotes: QuoteService::new(Arc::new(FixedQuote), QuoteCache::new(ttl)),
        }
    }

    #[tokio::test]
    async fn test_evicts_only_expired_entries() {
        let ctx = context(Duration::minutes(5));
        ctx.quotes.quote("AAPL").await.unwrap();

        let result = evict_expired_quotes(ctx.clone()).await.unwrap();
        assert_eq!(result.items_processed, 0);
        assert_eq!(ctx.quotes.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_evicts_everything() {
        let ctx = context(Duration::zero());
        ctx.quotes.quote("AAPL").await.unwrap();
        ctx.quotes.quote("MSFT").await.unwrap();

        let result = evict_expired_quotes(ctx.clone()).await.unwrap();
        assert_eq!(result.items_processed, 2);
        assert!(ctx.quotes.cache().is_empty());
    }
}
