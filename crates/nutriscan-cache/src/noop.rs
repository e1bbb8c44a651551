//! No-op cache implementation.

use async_trait::async_trait;
use nutriscan_core::{Barcode, NutritionData, ProductCache, Result};
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get` always returns `Ok(None)` and `put` returns `Ok(())`.
/// Used when caching is disabled in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProductCache for NoopCache {
    async fn get(&self, _barcode: &Barcode) -> Result<Option<NutritionData>> {
        trace!("NoopCache: get called, returning None");
        Ok(None)
    }

    async fn put(&self, _barcode: &Barcode, _data: &NutritionData) -> Result<()> {
        trace!("NoopCache: put called, doing nothing");
        Ok(())
    }

    async fn invalidate_stale(&self) -> Result<usize> {
        trace!("NoopCache: invalidate_stale called, returning 0");
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        trace!("NoopCache: clear called, doing nothing");
        Ok(())
    }
}
