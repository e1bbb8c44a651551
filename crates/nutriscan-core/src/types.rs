//! Core data types for product lookups.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Barcode`] - Product identifier used as lookup and cache key
//! - [`Nutrients`] - Per-100g nutrient values
//! - [`ProductPayload`] - A product record as returned by the upstream database
//! - [`NutritionData`] - A product's nutrition facts, ready for presentation

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::grade::{Grade, GradeFields};

/// Display name used when the upstream record has no product name.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown product";

/// A product barcode (EAN-13, UPC-A, ...).
///
/// Barcodes are trimmed on creation. An empty barcode is representable and
/// means there is nothing to look up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Barcode(String);

impl Barcode {
    /// Creates a new barcode from a string, trimming surrounding whitespace.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.len() == s.len() {
            Self(s)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Returns the barcode as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if there is nothing to look up.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Barcode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Barcode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Barcode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Nutrient values per 100g.
///
/// Field names follow the upstream `nutriments` object. Any subset may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    /// Energy in kcal.
    #[serde(
        rename = "energy-kcal_100g",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub energy_kcal: Option<f64>,
    /// Protein in grams.
    #[serde(
        rename = "proteins_100g",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub proteins: Option<f64>,
    /// Carbohydrates in grams.
    #[serde(
        rename = "carbohydrates_100g",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub carbohydrates: Option<f64>,
    /// Fat in grams.
    #[serde(
        rename = "fat_100g",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub fat: Option<f64>,
    /// Fiber in grams.
    #[serde(
        rename = "fiber_100g",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub fiber: Option<f64>,
    /// Sodium in grams.
    #[serde(
        rename = "sodium_100g",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub sodium: Option<f64>,
}

impl Nutrients {
    /// Sodium converted to milligrams.
    #[must_use]
    pub fn sodium_mg(&self) -> Option<f64> {
        self.sodium.map(|grams| grams * 1000.0)
    }

    /// Returns true if no nutrient value is known.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.energy_kcal.is_none()
            && self.proteins.is_none()
            && self.carbohydrates.is_none()
            && self.fat.is_none()
            && self.fiber.is_none()
            && self.sodium.is_none()
    }
}

/// Accepts JSON numbers and numeric strings; everything else is absent.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A product record as returned by the upstream database.
///
/// Only the fields this crate reads are modelled; grade candidates are kept
/// verbatim in [`GradeFields`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    /// Product display name.
    #[serde(default)]
    pub product_name: Option<String>,
    /// Comma-separated brand names.
    #[serde(default)]
    pub brands: Option<String>,
    /// Generic product image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Full-size front image.
    #[serde(default)]
    pub image_front_url: Option<String>,
    /// Thumbnail front image.
    #[serde(default)]
    pub image_front_small_url: Option<String>,
    /// Nutrient table, only present in full lookups.
    #[serde(default)]
    pub nutriments: Option<Nutrients>,
    /// Raw grade candidates.
    #[serde(flatten)]
    pub grades: GradeFields,
}

/// A product's nutrition facts at a point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NutritionData {
    /// Display name.
    pub name: String,
    /// Brand, if known.
    pub brand: Option<String>,
    /// Preferred product image.
    pub image_url: Option<String>,
    /// Nutrient values per 100g.
    pub nutrients: Option<Nutrients>,
    /// Raw grade candidates, kept for the resolver.
    pub grades: GradeFields,
    /// True when only the quick lookup populated this record.
    pub is_partial: bool,
}

impl NutritionData {
    /// Builds a partial record from a quick lookup, preferring the small front image.
    #[must_use]
    pub fn partial(payload: ProductPayload) -> Self {
        let image_url = first_non_empty(
            payload.image_front_small_url.as_deref(),
            payload.image_url.as_deref(),
        );
        Self::from_payload(payload, image_url, true)
    }

    /// Builds a complete record from a full lookup, preferring the full front image.
    #[must_use]
    pub fn complete(payload: ProductPayload) -> Self {
        let image_url =
            first_non_empty(payload.image_front_url.as_deref(), payload.image_url.as_deref());
        Self::from_payload(payload, image_url, false)
    }

    fn from_payload(payload: ProductPayload, image_url: Option<String>, is_partial: bool) -> Self {
        let name = payload
            .product_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string());

        Self {
            name,
            brand: payload.brands.filter(|brand| !brand.trim().is_empty()),
            image_url,
            nutrients: payload.nutriments,
            grades: payload.grades,
            is_partial,
        }
    }

    /// Resolves the Nutri-Score grade from the raw candidates.
    #[must_use]
    pub fn grade(&self) -> Option<Grade> {
        self.grades.resolve()
    }
}

fn first_non_empty(preferred: Option<&str>, fallback: Option<&str>) -> Option<String> {
    preferred
        .filter(|url| !url.is_empty())
        .or_else(|| fallback.filter(|url| !url.is_empty()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> ProductPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_barcode_trims() {
        let barcode = Barcode::new("  3017620422003\n");
        assert_eq!(barcode.as_str(), "3017620422003");
        assert!(Barcode::new("   ").is_empty());
        assert_eq!(Barcode::from("42").to_string(), "42");
    }

    #[test]
    fn test_partial_prefers_small_front_image() {
        let data = NutritionData::partial(payload(json!({
            "product_name": "Cola",
            "image_url": "https://img/generic.jpg",
            "image_front_small_url": "https://img/front_small.jpg",
            "image_front_url": "https://img/front.jpg",
        })));

        assert!(data.is_partial);
        assert_eq!(data.image_url.as_deref(), Some("https://img/front_small.jpg"));
    }

    #[test]
    fn test_complete_prefers_front_image() {
        let data = NutritionData::complete(payload(json!({
            "product_name": "Cola",
            "image_url": "https://img/generic.jpg",
            "image_front_small_url": "https://img/front_small.jpg",
            "image_front_url": "https://img/front.jpg",
        })));

        assert!(!data.is_partial);
        assert_eq!(data.image_url.as_deref(), Some("https://img/front.jpg"));
    }

    #[test]
    fn test_empty_image_falls_back_to_generic() {
        let data = NutritionData::complete(payload(json!({
            "product_name": "Cola",
            "image_front_url": "",
            "image_url": "https://img/generic.jpg",
        })));
        assert_eq!(data.image_url.as_deref(), Some("https://img/generic.jpg"));

        let data = NutritionData::complete(payload(json!({ "product_name": "Cola" })));
        assert!(data.image_url.is_none());
    }

    #[test]
    fn test_missing_name_and_blank_brand() {
        let data = NutritionData::complete(payload(json!({ "brands": "  " })));
        assert_eq!(data.name, UNKNOWN_PRODUCT_NAME);
        assert!(data.brand.is_none());
    }

    #[test]
    fn test_nutrients_accept_numbers_and_numeric_strings() {
        let data = NutritionData::complete(payload(json!({
            "product_name": "Hazelnut spread",
            "nutriments": {
                "energy-kcal_100g": 539,
                "proteins_100g": "6.3",
                "carbohydrates_100g": 57.5,
                "fat_100g": null,
                "fiber_100g": "n/a",
                "sodium_100g": 0.0428,
                "salt_100g": 0.107
            }
        })));

        let nutrients = data.nutrients.unwrap();
        assert_eq!(nutrients.energy_kcal, Some(539.0));
        assert_eq!(nutrients.proteins, Some(6.3));
        assert_eq!(nutrients.carbohydrates, Some(57.5));
        assert_eq!(nutrients.fat, None);
        assert_eq!(nutrients.fiber, None);
        assert!((nutrients.sodium_mg().unwrap() - 42.8).abs() < 1e-9);
        assert!(!nutrients.is_empty());
    }

    #[test]
    fn test_grade_fields_survive_payload_conversion() {
        let data = NutritionData::partial(payload(json!({
            "product_name": "Cola",
            "nutrition_grades": "e"
        })));
        assert_eq!(data.grade(), Some(Grade::E));
    }
}
