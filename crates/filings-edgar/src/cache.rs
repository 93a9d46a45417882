//! In-process response cache with TTL-based expiry.
//!
//! Entries hold parsed responses and an absolute expiry instant; expiry is
//! checked lazily on read, so an expired entry is a transparent miss. An
//! explicit [`ResponseCache::sweep`] evicts expired entries but is not
//! required for correctness.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::ParsedResponse;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: ParsedResponse,
    expires_at: DateTime<Utc>,
}

/// TTL cache for parsed API responses, keyed by `{kind}_{cik}`.
#[derive(Debug)]
pub(crate) struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the cached parse for `key` if present and unexpired.
    pub(crate) async fn get(&self, key: &str) -> Option<ParsedResponse> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => {
                debug!(key, "cache hit");
                Some(entry.data.clone())
            }
            Some(_) => {
                debug!(key, "cache entry expired");
                None
            }
            None => {
                debug!(key, "cache miss");
                None
            }
        }
    }

    /// Stores a parsed response with expiry `now + ttl`. Only called after a
    /// successful parse.
    pub(crate) async fn put(&self, key: String, data: ParsedResponse) {
        let expires_at = Utc::now() + TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        self.entries
            .write()
            .await
            .insert(key, CacheEntry { data, expires_at });
    }

    /// Evicts expired entries, returning how many were removed.
    pub(crate) async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Drops every entry.
    pub(crate) async fn clear(&self) {
        self.entries.write().await.clear();
    }

    #[cfg(test)]
    async fn put_with_expiry(&self, key: String, data: ParsedResponse, expires_at: DateTime<Utc>) {
        self.entries
            .write()
            .await
            .insert(key, CacheEntry { data, expires_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TickerRecord;
    use filings_core::Cik;

    fn tickers() -> ParsedResponse {
        ParsedResponse::Tickers(vec![TickerRecord {
            cik: Cik::new("12927").unwrap(),
            ticker: "CAT".to_string(),
            title: "Caterpillar Inc.".to_string(),
        }])
    }

    #[tokio::test]
    async fn hit_within_ttl_returns_the_stored_parse() {
        let cache = ResponseCache::new(Duration::from_secs(3600));
        assert!(cache.get("company_tickers").await.is_none());

        cache.put("company_tickers".to_string(), tickers()).await;

        let first = cache.get("company_tickers").await.unwrap();
        let second = cache.get("company_tickers").await.unwrap();
        let (ParsedResponse::Tickers(a), ParsedResponse::Tickers(b)) = (first, second) else {
            panic!("expected ticker responses");
        };
        assert_eq!(a, b);
        assert_eq!(a[0].ticker, "CAT");
    }

    #[tokio::test]
    async fn expired_entry_is_a_transparent_miss() {
        let cache = ResponseCache::new(Duration::from_secs(3600));
        let past = Utc::now() - TimeDelta::seconds(1);
        cache
            .put_with_expiry("company_tickers".to_string(), tickers(), past)
            .await;

        assert!(cache.get("company_tickers").await.is_none());
    }

    #[tokio::test]
    async fn sweep_evicts_only_expired_entries() {
        let cache = ResponseCache::new(Duration::from_secs(3600));
        let past = Utc::now() - TimeDelta::seconds(1);
        cache
            .put_with_expiry("submissions_0000012927".to_string(), tickers(), past)
            .await;
        cache.put("company_tickers".to_string(), tickers()).await;

        assert_eq!(cache.sweep().await, 1);
        assert!(cache.get("company_tickers").await.is_some());
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = ResponseCache::new(Duration::from_secs(3600));
        cache.put("company_tickers".to_string(), tickers()).await;
        cache.clear().await;
        assert!(cache.get("company_tickers").await.is_none());
    }
}
