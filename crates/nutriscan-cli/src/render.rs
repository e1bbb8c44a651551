//! Text and JSON rendering of lookup results.

use std::fmt::Write;

use nutriscan::{Barcode, Grade, Nutrients, NutritionData};
use serde::Serialize;

const NOT_AVAILABLE: &str = "N/A";

/// One line shown while the full lookup is still running.
pub(crate) fn preview(data: &NutritionData) -> String {
    let grade = data
        .grade()
        .map_or_else(|| "?".to_string(), |g| g.as_str().to_uppercase());
    format!(
        "{} [Nutri-Score {grade}] (loading full details...)",
        title(data)
    )
}

/// Human readable product card.
pub(crate) fn text(data: &NutritionData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", title(data));
    if let Some(image) = &data.image_url {
        let _ = writeln!(out, "  Image: {image}");
    }

    let grade = data.grade();
    let _ = writeln!(out, "  {}", scale(grade));
    match grade {
        Some(grade) => write_grade(&mut out, grade),
        None => {
            let _ = writeln!(out, "  Nutri-Score unavailable for this product");
            let _ = writeln!(
                out,
                "  This product doesn't have a Nutri-Score rating in the database"
            );
        }
    }

    if let Some(nutrients) = &data.nutrients {
        write_nutrients(&mut out, nutrients);
    } else if data.is_partial {
        let _ = writeln!(out, "  Nutrition facts: loading...");
    }

    out
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    barcode: &'a Barcode,
    grade: Option<Grade>,
    #[serde(flatten)]
    product: &'a NutritionData,
}

/// The record with its resolved grade as a single JSON line.
pub(crate) fn json(barcode: &Barcode, data: &NutritionData) -> serde_json::Result<String> {
    serde_json::to_string(&JsonRecord {
        barcode,
        grade: data.grade(),
        product: data,
    })
}

fn title(data: &NutritionData) -> String {
    match &data.brand {
        Some(brand) => format!("{} ({brand})", data.name),
        None => data.name.clone(),
    }
}

/// The A-E scale with the active grade bracketed, e.g. `A B [C] D E`.
fn scale(active: Option<Grade>) -> String {
    Grade::ALL
        .iter()
        .map(|&grade| {
            let letter = grade.as_str().to_uppercase();
            if Some(grade) == active {
                format!("[{letter}]")
            } else {
                letter
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_grade(out: &mut String, grade: Grade) {
    let _ = writeln!(
        out,
        "  Nutri-Score {}: {}",
        grade.as_str().to_uppercase(),
        grade.health_label()
    );
    let _ = writeln!(out, "  {}", grade.recommendation());
}

fn write_nutrients(out: &mut String, n: &Nutrients) {
    let _ = writeln!(out, "  Nutrition facts (per 100g):");
    let _ = writeln!(out, "    Calories  {}", amount(n.energy_kcal, 1, "kcal"));
    let _ = writeln!(out, "    Protein   {}", amount(n.proteins, 1, "g"));
    let _ = writeln!(out, "    Carbs     {}", amount(n.carbohydrates, 1, "g"));
    let _ = writeln!(out, "    Fat       {}", amount(n.fat, 1, "g"));
    if n.fiber.is_some() {
        let _ = writeln!(out, "    Fiber     {}", amount(n.fiber, 1, "g"));
    }
    if let Some(sodium) = n.sodium_mg() {
        let _ = writeln!(out, "    Sodium    {}", amount(Some(sodium), 0, "mg"));
    }
}

fn amount(value: Option<f64>, decimals: usize, unit: &str) -> String {
    value.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |v| {
            let v = round_half_away(v, decimals);
            format!("{v:.decimals$} {unit}")
        },
    )
}

/// Rounds ties away from zero; `{:.N}` alone rounds them to even.
fn round_half_away(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn product(value: Value) -> NutritionData {
        NutritionData::complete(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_text_with_grade_and_nutrients() {
        let data = product(json!({
            "product_name": "Hazelnut Spread",
            "brands": "Nutty",
            "nutriscore_grade": "e",
            "nutriments": {
                "energy-kcal_100g": 539,
                "proteins_100g": 6.3,
                "fat_100g": 30.9,
                "fiber_100g": 3.44,
                "sodium_100g": 0.0428
            }
        }));

        let out = text(&data);
        assert!(out.starts_with("Hazelnut Spread (Nutty)\n"));
        assert!(out.contains("  A B C D [E]\n"));
        assert!(out.contains("Nutri-Score E: Avoid"));
        assert!(out.contains("Unhealthy – avoid or remove from diet"));
        assert!(out.contains("Calories  539.0 kcal"));
        assert!(out.contains("Carbs     N/A"));
        assert!(out.contains("Fiber     3.4 g"));
        assert!(out.contains("Sodium    43 mg"));
    }

    #[test]
    fn test_text_without_grade() {
        let data = product(json!({ "product_name": "Tap Water" }));

        let out = text(&data);
        assert!(out.contains("Nutri-Score unavailable for this product"));
        assert!(out.contains("This product doesn't have a Nutri-Score rating in the database"));
        assert!(out.contains("  A B C D E\n"));
        assert!(!out.contains("Nutrition facts"));
    }

    #[test]
    fn test_text_skips_absent_secondary_nutrients() {
        let data = product(json!({ "nutriments": { "fat_100g": 1 } }));

        let out = text(&data);
        assert!(out.starts_with("Unknown product\n"));
        assert!(!out.contains("Fiber"));
        assert!(!out.contains("Sodium"));
    }

    #[test]
    fn test_preview() {
        let data = NutritionData::partial(
            serde_json::from_value(json!({ "product_name": "Cola", "nutrition_grades": "d" }))
                .unwrap(),
        );
        assert_eq!(
            preview(&data),
            "Cola [Nutri-Score D] (loading full details...)"
        );
        assert!(text(&data).contains("Nutrition facts: loading..."));
    }

    #[test]
    fn test_json_includes_resolved_grade() {
        let data = product(json!({ "product_name": "Oats", "nutrition_grade_fr": "a" }));

        let line = json(&Barcode::new("42"), &data).unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["barcode"], "42");
        assert_eq!(value["grade"], "a");
        assert_eq!(value["name"], "Oats");
        assert_eq!(value["is_partial"], false);
    }

    #[test]
    fn test_amounts_round_ties_away_from_zero() {
        let data = product(json!({
            "nutriments": {
                "fat_100g": 2.25,
                "fiber_100g": 0.25,
                "sodium_100g": 0.0005
            }
        }));

        let out = text(&data);
        assert!(out.contains("Fat       2.3 g"));
        assert!(out.contains("Fiber     0.3 g"));
        assert!(out.contains("Sodium    1 mg"));
    }

    #[test]
    fn test_scale_marks_active_grade() {
        assert_eq!(scale(Some(Grade::C)), "A B [C] D E");
        assert_eq!(scale(None), "A B C D E");
    }
}
