//! Product source trait and lookup kinds.
//!
//! A lookup for one barcode happens in up to three shapes:
//!
//! - [`LookupKind::Quick`] - minimal fields for an early first render
//! - [`LookupKind::Full`] - the complete field set including nutrients
//! - [`LookupKind::Legacy`] - the legacy endpoint, used only to recover a missing grade

use async_trait::async_trait;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

use crate::{
    error::Result,
    types::{Barcode, ProductPayload},
};

/// Fields requested by the quick lookup.
pub const QUICK_FIELDS: &[&str] = &[
    "product_name",
    "brands",
    "image_front_small_url",
    "image_url",
    "nutrition_grades",
    "nutriscore_grade",
    "nutriscore_2023_grade",
    "nutriscore_2021_grade",
    "nutrition_grade_fr",
    "nutriscore",
    "nutriscore_data",
];

/// Fields requested by the full lookup.
pub const FULL_FIELDS: &[&str] = &[
    "product_name",
    "brands",
    "image_url",
    "image_front_url",
    "image_front_small_url",
    "nutriments",
    "nutrition_grades",
    "nutrition_grades_tags",
    "nutriscore_grade",
    "nutriscore_2023_grade",
    "nutriscore_2021_grade",
    "nutrition_grade_fr",
    "nutriscore",
    "nutriscore_data",
];

/// Request priority hint for transports that support prioritization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    /// No hint.
    #[default]
    Normal,
    /// Ask the transport to schedule this request early.
    High,
}

/// The shape of a product lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// Minimal field set.
    Quick,
    /// Complete field set.
    Full,
    /// Legacy endpoint, all fields.
    Legacy,
}

impl LookupKind {
    /// Fields to request, or `None` when the endpoint returns everything.
    #[must_use]
    pub const fn fields(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Quick => Some(QUICK_FIELDS),
            Self::Full => Some(FULL_FIELDS),
            Self::Legacy => None,
        }
    }

    /// Priority hint for this lookup.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        match self {
            Self::Quick => Priority::High,
            Self::Full | Self::Legacy => Priority::Normal,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
            Self::Legacy => "legacy",
        }
    }
}

/// An upstream product database.
///
/// Implementations return [`NutriError::ProductNotFound`](crate::NutriError::ProductNotFound)
/// when the database reports no product, and
/// [`NutriError::Cancelled`](crate::NutriError::Cancelled) when `cancel` fires
/// before the response is available.
#[async_trait]
pub trait ProductSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "Open Food Facts").
    fn name(&self) -> &str;

    /// Fetches one product record.
    async fn fetch_product(
        &self,
        barcode: &Barcode,
        kind: LookupKind,
        cancel: &CancellationToken,
    ) -> Result<ProductPayload>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_fields_cover_grade_candidates() {
        for field in FULL_FIELDS {
            if field.contains("grade") || field.starts_with("nutriscore") {
                if *field == "nutrition_grades_tags" {
                    continue;
                }
                assert!(QUICK_FIELDS.contains(field), "quick lookup misses {field}");
            }
        }
        assert!(!QUICK_FIELDS.contains(&"nutriments"));
        assert!(FULL_FIELDS.contains(&"nutriments"));
    }

    #[test]
    fn test_priority() {
        assert_eq!(LookupKind::Quick.priority(), Priority::High);
        assert_eq!(LookupKind::Full.priority(), Priority::Normal);
        assert!(LookupKind::Legacy.fields().is_none());
    }
}
