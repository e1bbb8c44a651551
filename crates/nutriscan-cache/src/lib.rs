#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/nutriscan/nutriscan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for nutriscan product lookups.
//!
//! This crate provides implementations of the [`ProductCache`] trait from `nutriscan-core`:
//!
//! - [`InMemoryCache`] - In-memory cache with a time-to-live (default 10 minutes)
//! - [`NoopCache`] - No-op cache that doesn't store anything

/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use nutriscan_core::ProductCache;

// Re-export implementations
pub use memory::InMemoryCache;
pub use noop::NoopCache;
