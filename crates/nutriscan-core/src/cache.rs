//! Cache trait for storing fetched products.
//!
//! This module defines the [`ProductCache`] trait that provides a unified interface
//! for caching complete nutrition records by barcode.

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{Barcode, NutritionData},
};

/// Default time-to-live for cached products.
pub const DEFAULT_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(10 * 60);

/// Trait for caching fetched products.
///
/// Only complete records (`is_partial == false`) are eligible for caching.
/// Expiry is checked lazily on read.
#[async_trait]
pub trait ProductCache: Send + Sync + std::fmt::Debug {
    /// Retrieves a cached product.
    ///
    /// Returns `Ok(Some(data))` if a fresh entry exists, `Ok(None)` if not
    /// cached or expired. Expired entries are evicted.
    async fn get(&self, barcode: &Barcode) -> Result<Option<NutritionData>>;

    /// Stores a complete product, replacing any existing entry.
    async fn put(&self, barcode: &Barcode, data: &NutritionData) -> Result<()>;

    /// Removes expired entries.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
