#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/nutriscan/nutriscan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for barcode nutrition lookups.
//!
//! This crate provides the foundational abstractions for working with product data:
//!
//! - [`ProductSource`](source::ProductSource) - Upstream product database
//! - [`ProductCache`](cache::ProductCache) - Caching abstraction
//! - [`GradeFields`](grade::GradeFields) - Raw Nutri-Score candidates and the grade resolver
//! - [`NutritionData`](types::NutritionData) - A product's nutrition facts

/// Cache trait for storing fetched products.
pub mod cache;
/// Error types for lookup operations.
pub mod error;
/// Nutri-Score grades and the multi-field grade resolver.
pub mod grade;
/// Product source trait and lookup kinds.
pub mod source;
/// Core data types (Barcode, NutritionData, Nutrients, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::ProductCache;
pub use error::{NutriError, Result};
pub use grade::{Grade, GradeFields, RawField, normalize_grade};
pub use source::{LookupKind, Priority, ProductSource};
pub use types::{Barcode, Nutrients, NutritionData, ProductPayload};

/// Re-exported so implementors of [`ProductSource`] share one token type.
pub use tokio_util::sync::CancellationToken;
