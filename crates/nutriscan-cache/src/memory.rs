//! In-memory cache implementation.

use async_trait::async_trait;
use nutriscan_core::{
    Barcode, NutriError, NutritionData, ProductCache, Result, cache::DEFAULT_CACHE_TTL,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: NutritionData,
    cached_at: Instant,
}

impl CacheEntry {
    fn new(data: NutritionData) -> Self {
        Self {
            data,
            cached_at: Instant::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// In-memory product cache with a time-to-live.
///
/// Entries are kept in a `RwLock`-protected `HashMap` and are lost when the
/// cache is dropped. Expired entries are evicted when read, or in bulk by
/// [`ProductCache::invalidate_stale`].
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<Barcode, CacheEntry>>,
    ttl: Duration,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }
}

impl InMemoryCache {
    /// Create a new empty cache with the default 10 minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// The configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries currently held, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ProductCache for InMemoryCache {
    #[instrument(skip(self), fields(barcode = %barcode))]
    async fn get(&self, barcode: &Barcode) -> Result<Option<NutritionData>> {
        {
            let cache = self.entries.read().await;
            match cache.get(barcode) {
                Some(entry) if !entry.is_stale(self.ttl) && !entry.data.is_partial => {
                    debug!("Cache hit for product");
                    return Ok(Some(entry.data.clone()));
                }
                Some(_) => {}
                None => {
                    debug!("Cache miss for product");
                    return Ok(None);
                }
            }
        }

        // Re-check under the write lock, a concurrent put may have refreshed it
        let mut cache = self.entries.write().await;
        match cache.get(barcode) {
            Some(entry) if !entry.is_stale(self.ttl) && !entry.data.is_partial => {
                debug!("Cache hit for product");
                Ok(Some(entry.data.clone()))
            }
            Some(_) => {
                cache.remove(barcode);
                debug!("Evicted expired product");
                Ok(None)
            }
            None => {
                debug!("Cache miss for product");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, data), fields(barcode = %barcode, name = %data.name))]
    async fn put(&self, barcode: &Barcode, data: &NutritionData) -> Result<()> {
        if data.is_partial {
            return Err(NutriError::Cache(format!(
                "refusing to cache partial record for {barcode}"
            )));
        }

        let mut cache = self.entries.write().await;
        cache.insert(barcode.clone(), CacheEntry::new(data.clone()));
        debug!("Cached product");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self) -> Result<usize> {
        let mut cache = self.entries.write().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_stale(self.ttl));
        let removed = before - cache.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}
