//! Observable search state, user-facing notices and search outcomes.

use nutriscan_core::{Barcode, NutritionData};
use std::fmt;

/// Which network phase a search is in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadingStage {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Waiting for the quick lookup.
    Quick,
    /// A partial record is published; waiting for the full lookup.
    Full,
}

impl LoadingStage {
    /// Short name for display and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Quick => "quick",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for LoadingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of what presentation layers should show.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchState {
    /// The current product, partial or complete.
    pub result: Option<NutritionData>,
    /// Current loading stage.
    pub stage: LoadingStage,
}

impl SearchState {
    /// Returns true while a lookup is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.stage != LoadingStage::Idle
    }
}

/// A user-facing notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The database has no product for the barcode.
    NotFound {
        /// The barcode that was looked up.
        barcode: Barcode,
    },
    /// The quick or full lookup failed.
    FetchFailed {
        /// The barcode that was looked up.
        barcode: Barcode,
    },
}

impl Notice {
    /// Message to show the user.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "Product not found. Try another barcode.",
            Self::FetchFailed { .. } => "Failed to fetch product data. Please try again.",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// How a call to [`ProductSearch::search`](crate::ProductSearch::search) ended.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    /// The barcode was empty; nothing happened.
    Ignored,
    /// Served from the cache without network calls.
    Cached(NutritionData),
    /// Both lookups succeeded; the record was published and cached.
    Complete(NutritionData),
    /// The full lookup found nothing; the partial record stays published.
    Partial(NutritionData),
    /// The database has no product for the barcode.
    NotFound,
    /// The quick or full lookup failed.
    Failed,
    /// A newer search started before this one finished.
    Superseded,
}

impl SearchOutcome {
    /// The record this search produced, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&NutritionData> {
        match self {
            Self::Cached(data) | Self::Complete(data) | Self::Partial(data) => Some(data),
            _ => None,
        }
    }
}
