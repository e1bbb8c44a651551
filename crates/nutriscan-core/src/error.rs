//! Error types for lookup operations.
//!
//! This module defines [`NutriError`] which covers all error cases that can occur
//! when fetching, parsing, or caching product data.

use thiserror::Error;

use crate::types::Barcode;

/// Errors that can occur during lookup operations.
#[derive(Error, Debug)]
pub enum NutriError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by the upstream database.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The upstream database reports no product for the barcode.
    #[error("Product not found: {0}")]
    ProductNotFound(Barcode),

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// The lookup was superseded by a newer one.
    #[error("Lookup cancelled")]
    Cancelled,

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl NutriError {
    /// Returns true for errors that should be shown to the user as a
    /// generic fetch failure (everything except not-found and cancellation).
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Self::ProductNotFound(_) | Self::Cancelled)
    }
}

/// Result type alias using [`NutriError`].
pub type Result<T> = std::result::Result<T, NutriError>;
