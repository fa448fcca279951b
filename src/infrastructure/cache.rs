use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::shipping::Quote;

#[derive(Clone)]
struct CacheEntry {
    quote: Quote,
    created_at: Instant,
}

/// Process-wide TTL cache for computed quotes.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. Reads treat
/// expired entries as absent; the periodic sweep bounds memory growth from
/// abandoned keys. Failures are never stored, only successful quotes.
#[derive(Clone)]
pub struct QuoteCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Quote> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.created_at.elapsed() < self.ttl)
            .map(|entry| entry.quote.clone())
    }

    pub async fn insert(&self, key: String, quote: Quote) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                quote,
                created_at: Instant::now(),
            },
        );
    }

    /// Removes expired entries in a single pass, returning how many were
    /// evicted.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Spawns the detached sweeper task.
    pub fn spawn_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = cache.sweep().await;
                if evicted > 0 {
                    debug!(evicted, "swept expired shipping quotes");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote() -> Quote {
        Quote {
            options: Vec::new(),
            estimated: true,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = QuoteCache::new(Duration::from_secs(60));
        cache.insert("k".to_string(), quote()).await;

        assert!(cache.get("k").await.is_some());
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_read_as_absent() {
        let cache = QuoteCache::new(Duration::from_millis(10));
        cache.insert("k".to_string(), quote()).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("k").await.is_none());
        // lazy expiry leaves the entry in place for the sweeper
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_evicts_only_expired() {
        let cache = QuoteCache::new(Duration::from_millis(50));
        cache.insert("old".to_string(), quote()).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.insert("fresh".to_string(), quote()).await;

        assert_eq!(cache.sweep().await, 1);
        assert!(cache.get("fresh").await.is_some());
        assert_eq!(cache.len().await, 1);
    }
}
