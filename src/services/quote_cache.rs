use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::external::quote_provider::Quote;

#[derive(Debug, Clone)]
struct CachedQuote {
    quote: Quote,
    fetched_at: DateTime<Utc>,
}

/// Thread-safe quote cache with a flat TTL, keyed by upper-cased symbol.
/// Stale entries are ignored on read and dropped by [`QuoteCache::cleanup_expired`].
#[derive(Clone)]
pub struct QuoteCache {
    entries: Arc<DashMap<String, CachedQuote>>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    fn is_fresh(&self, cached: &CachedQuote, now: DateTime<Utc>) -> bool {
        now < cached.fetched_at + self.ttl
    }

    pub fn get(&self, symbol: &str) -> Option<Quote> {
        let key = symbol.to_uppercase();
        let now = Utc::now();
        {
            let entry = self.entries.get(&key)?;
            if self.is_fresh(&entry, now) {
                return Some(entry.quote.clone());
            }
        }

        self.evict_if_stale(&key, now);
        None
    }

    /// Freshness is re-checked under the shard write lock, so a quote
    /// inserted after the stale read survives.
    fn evict_if_stale(&self, key: &str, now: DateTime<Utc>) {
        self.entries.remove_if(key, |_, cached| !self.is_fresh(cached, now));
    }

    pub fn insert(&self, symbol: &str, quote: Quote) {
        self.insert_at(symbol, quote, Utc::now());
    }

    fn insert_at(&self, symbol: &str, quote: Quote, fetched_at: DateTime<Utc>) {
        self.entries
            .insert(symbol.to_uppercase(), CachedQuote { quote, fetched_at });
    }

    /// Drops every expired entry; returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, cached| self.is_fresh(cached, now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
