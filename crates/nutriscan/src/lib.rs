#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/nutriscan/nutriscan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # Features
//!
//! - `off` (default) - Open Food Facts provider and [`ProductSearch::from_config`]

// Core types and traits
pub use nutriscan_core::*;

// Cache implementations
pub use nutriscan_cache::{InMemoryCache, NoopCache};

// Providers
#[cfg(feature = "off")]
pub use nutriscan_off::OpenFoodFactsProvider;

mod config;
pub use config::{CONFIG_FILE_ENV, ConfigError, ENV_PREFIX, NutriConfig};

mod search;
pub use search::{ProductSearch, shared_cache};

mod state;
pub use state::{LoadingStage, Notice, SearchOutcome, SearchState};
