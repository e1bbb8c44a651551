//! Nutri-Score grades and the multi-field grade resolver.
//!
//! Upstream records carry the grade under several names depending on when the
//! product was last scored: a top-level string, a tag list, dated scheme fields,
//! a legacy country-specific field, and nested score objects. [`GradeFields`]
//! keeps all of them verbatim and [`GradeFields::resolve`] picks the first one
//! that normalizes to a valid letter.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// A Nutri-Score grade, from `A` (best) to `E` (worst).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    /// Best nutritional quality.
    A,
    /// Good nutritional quality.
    B,
    /// Average nutritional quality.
    C,
    /// Poor nutritional quality.
    D,
    /// Worst nutritional quality.
    E,
}

impl Grade {
    /// All grades, best first.
    pub const ALL: [Self; 5] = [Self::A, Self::B, Self::C, Self::D, Self::E];

    /// Parses an exact lowercase letter.
    #[must_use]
    pub fn from_letter(s: &str) -> Option<Self> {
        match s {
            "a" => Some(Self::A),
            "b" => Some(Self::B),
            "c" => Some(Self::C),
            "d" => Some(Self::D),
            "e" => Some(Self::E),
            _ => None,
        }
    }

    /// The lowercase letter for this grade.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
            Self::D => "d",
            Self::E => "e",
        }
    }

    /// Short health verdict shown next to the grade.
    #[must_use]
    pub const fn health_label(&self) -> &'static str {
        match self {
            Self::A => "Excellent Choice",
            Self::B => "Healthy",
            Self::C => "Moderate",
            Self::D => "Unhealthy",
            Self::E => "Avoid",
        }
    }

    /// Consumption advice for this grade.
    #[must_use]
    pub const fn recommendation(&self) -> &'static str {
        match self {
            Self::A => "Great choice – safe to consume regularly",
            Self::B => "Good choice – safe to consume regularly",
            Self::C => "Consume in moderation",
            Self::D => "Limit consumption – choose healthier alternatives",
            Self::E => "Unhealthy – avoid or remove from diet",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizes one raw candidate value to a grade.
///
/// The value is trimmed and lowercased; a namespace prefix such as `en:` is
/// stripped by taking everything after the last colon. Anything that is not
/// exactly one of `a`..`e` afterwards yields `None`.
#[must_use]
pub fn normalize_grade(value: &str) -> Option<Grade> {
    let s = value.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }
    let letter = match s.rsplit_once(':') {
        Some((_, tail)) => tail,
        None => s.as_str(),
    };
    Grade::from_letter(letter)
}

/// A raw, loosely typed upstream field.
///
/// Absence is modelled by wrapping this in `Option`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    /// A plain string.
    Text(String),
    /// A list, usually of tag strings.
    List(Vec<Value>),
    /// A nested object.
    Object(Map<String, Value>),
    /// Any other JSON value (numbers, booleans).
    Other(Value),
}

impl RawField {
    /// The value if it is a string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The first element if this is a list whose first element is a string.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        match self {
            Self::List(items) => items.first().and_then(Value::as_str),
            _ => None,
        }
    }

    /// A string member if this is an object.
    #[must_use]
    pub fn member_text(&self, key: &str) -> Option<&str> {
        match self {
            Self::Object(map) => map.get(key).and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Every upstream field that may carry a Nutri-Score grade.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeFields {
    /// Top-level grade, e.g. `"e"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition_grades: Option<RawField>,
    /// Grade tags, e.g. `["e"]` or `["en:e"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition_grades_tags: Option<RawField>,
    /// Current scheme grade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutriscore_grade: Option<RawField>,
    /// 2023 scheme grade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutriscore_2023_grade: Option<RawField>,
    /// 2021 scheme grade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutriscore_2021_grade: Option<RawField>,
    /// Legacy French grade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition_grade_fr: Option<RawField>,
    /// Nested score object with `grade` or `nutriscore_grade`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutriscore: Option<RawField>,
    /// Nested score data object with `grade`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutriscore_data: Option<RawField>,
}

impl GradeFields {
    /// Candidate values, most authoritative first.
    fn candidates(&self) -> [Option<&str>; 9] {
        [
            self.nutrition_grades.as_ref().and_then(RawField::as_text),
            self.nutrition_grades_tags
                .as_ref()
                .and_then(RawField::first_text),
            self.nutriscore_grade.as_ref().and_then(RawField::as_text),
            self.nutriscore_2023_grade.as_ref().and_then(RawField::as_text),
            self.nutriscore_2021_grade.as_ref().and_then(RawField::as_text),
            self.nutrition_grade_fr.as_ref().and_then(RawField::as_text),
            self.nutriscore
                .as_ref()
                .and_then(|field| field.member_text("grade")),
            self.nutriscore
                .as_ref()
                .and_then(|field| field.member_text("nutriscore_grade")),
            self.nutriscore_data
                .as_ref()
                .and_then(|field| field.member_text("grade")),
        ]
    }

    /// Returns true if any candidate normalizes to a grade.
    #[must_use]
    pub fn has_grade(&self) -> bool {
        self.candidates()
            .into_iter()
            .flatten()
            .any(|candidate| normalize_grade(candidate).is_some())
    }

    /// Resolves the grade from the first candidate that normalizes.
    ///
    /// `None` is a normal outcome for unscored products. When nothing
    /// resolves, the raw candidates are logged at debug level.
    #[must_use]
    pub fn resolve(&self) -> Option<Grade> {
        let grade = self
            .candidates()
            .into_iter()
            .flatten()
            .find_map(normalize_grade);

        if grade.is_none() {
            debug!(
                nutrition_grades = ?self.nutrition_grades,
                nutrition_grades_tags = ?self.nutrition_grades_tags,
                nutriscore_grade = ?self.nutriscore_grade,
                nutriscore_2023_grade = ?self.nutriscore_2023_grade,
                nutriscore_2021_grade = ?self.nutriscore_2021_grade,
                nutrition_grade_fr = ?self.nutrition_grade_fr,
                nutriscore = ?self.nutriscore,
                nutriscore_data = ?self.nutriscore_data,
                "Nutri-Score not found in grade candidates"
            );
        }

        grade
    }

    /// Merges grade fields from the legacy fallback record.
    ///
    /// Fallback values replace ours where present; ours are kept where the
    /// fallback is silent. `nutriscore_grade` is also filled from the
    /// fallback's `nutrition_grades` or `nutrition_grade_fr`. Dated scheme
    /// fields are not taken from the fallback.
    pub fn merge_fallback(&mut self, fallback: Self) {
        let Self {
            nutrition_grades,
            nutrition_grades_tags,
            nutriscore_grade,
            nutriscore_2023_grade: _,
            nutriscore_2021_grade: _,
            nutrition_grade_fr,
            nutriscore,
            nutriscore_data,
        } = fallback;

        let current_scheme = nutriscore_grade
            .or_else(|| nutrition_grades.clone())
            .or_else(|| nutrition_grade_fr.clone());

        replace_if_some(&mut self.nutrition_grades, nutrition_grades);
        replace_if_some(&mut self.nutrition_grades_tags, nutrition_grades_tags);
        replace_if_some(&mut self.nutrition_grade_fr, nutrition_grade_fr);
        replace_if_some(&mut self.nutriscore_grade, current_scheme);
        replace_if_some(&mut self.nutriscore_data, nutriscore_data);
        replace_if_some(&mut self.nutriscore, nutriscore);
    }
}

fn replace_if_some(slot: &mut Option<RawField>, value: Option<RawField>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> GradeFields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_valid_letters() {
        for (input, expected) in [
            ("a", Grade::A),
            ("B", Grade::B),
            (" c ", Grade::C),
            ("ns:D", Grade::D),
            ("en:e", Grade::E),
            ("x:y:a", Grade::A),
        ] {
            assert_eq!(normalize_grade(input), Some(expected), "input {input:?}");
        }
    }

    #[test]
    fn test_normalize_rejects_everything_else() {
        for input in ["", "   ", "f", "ab", "unknown", "not-applicable", "ns:", "en: a", "1"] {
            assert_eq!(normalize_grade(input), None, "input {input:?}");
        }
    }

    #[test]
    fn test_resolve_top_level() {
        assert_eq!(fields(json!({ "nutrition_grades": "e" })).resolve(), Some(Grade::E));
    }

    #[test]
    fn test_resolve_tags_first_element() {
        let grades = fields(json!({ "nutrition_grades_tags": ["en:b", "en:c"] }));
        assert_eq!(grades.resolve(), Some(Grade::B));
    }

    #[test]
    fn test_resolve_priority_order() {
        let grades = fields(json!({
            "nutriscore_2021_grade": "d",
            "nutriscore_2023_grade": "c",
            "nutrition_grade_fr": "e",
        }));
        assert_eq!(grades.resolve(), Some(Grade::C));

        let grades = fields(json!({
            "nutrition_grades": "unknown",
            "nutriscore_grade": "a",
            "nutrition_grade_fr": "e",
        }));
        assert_eq!(grades.resolve(), Some(Grade::A));
    }

    #[test]
    fn test_resolve_nested_objects() {
        let grades = fields(json!({ "nutriscore": { "grade": "b" } }));
        assert_eq!(grades.resolve(), Some(Grade::B));

        let grades = fields(json!({ "nutriscore": { "nutriscore_grade": "D" } }));
        assert_eq!(grades.resolve(), Some(Grade::D));

        let grades = fields(json!({ "nutriscore_data": { "grade": "a", "score": -3 } }));
        assert_eq!(grades.resolve(), Some(Grade::A));
    }

    #[test]
    fn test_resolve_ignores_wrong_shapes() {
        let grades = fields(json!({
            "nutrition_grades": ["a"],
            "nutrition_grades_tags": "b",
            "nutriscore_grade": 3,
            "nutriscore": "c",
            "nutriscore_data": null,
        }));
        assert_eq!(grades.resolve(), None);
        assert!(!grades.has_grade());
    }

    #[test]
    fn test_resolve_absent() {
        assert_eq!(GradeFields::default().resolve(), None);
    }

    #[test]
    fn test_merge_fallback_fills_missing_grade() {
        let mut full = GradeFields::default();
        full.merge_fallback(fields(json!({ "nutrition_grades": "d" })));

        assert_eq!(full.resolve(), Some(Grade::D));
        assert_eq!(full.nutriscore_grade, Some(RawField::Text("d".into())));
    }

    #[test]
    fn test_merge_fallback_prefers_fallback_values() {
        let mut full = fields(json!({
            "nutrition_grades": "unknown",
            "nutrition_grade_fr": "b",
            "nutriscore_2023_grade": "not-applicable",
        }));
        full.merge_fallback(fields(json!({
            "nutrition_grades": "c",
            "nutriscore_2023_grade": "a",
        })));

        assert_eq!(full.nutrition_grades, Some(RawField::Text("c".into())));
        assert_eq!(full.nutrition_grade_fr, Some(RawField::Text("b".into())));
        assert_eq!(
            full.nutriscore_2023_grade,
            Some(RawField::Text("not-applicable".into()))
        );
        assert_eq!(full.resolve(), Some(Grade::C));
    }

    #[test]
    fn test_merge_fallback_current_scheme_sources() {
        let mut full = fields(json!({ "nutriscore_grade": "unknown" }));
        full.merge_fallback(fields(json!({ "nutrition_grade_fr": "e" })));
        assert_eq!(full.nutriscore_grade, Some(RawField::Text("e".into())));

        let mut full = fields(json!({ "nutriscore_grade": "unknown" }));
        full.merge_fallback(GradeFields::default());
        assert_eq!(full.nutriscore_grade, Some(RawField::Text("unknown".into())));
    }

    #[test]
    fn test_grade_guidance() {
        assert_eq!(Grade::A.health_label(), "Excellent Choice");
        assert_eq!(Grade::E.recommendation(), "Unhealthy – avoid or remove from diet");
        assert_eq!(Grade::ALL.map(|g| g.to_string()).concat(), "abcde");
    }
}
