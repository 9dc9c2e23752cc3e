//! Field-level checks on the raw `POST /generate-ideas` payload.
//!
//! Validation runs on the untyped JSON so that every problem can be reported
//! at once, including values serde would reject with a single opaque message
//! (numeric strings, out-of-range enums).

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{BusinessModel, ExperienceLevel, GenerationRequest, IdeaType, RiskAppetite, Tag};

pub const PROMPT_MIN_CHARS: usize = 3;
pub const PROMPT_MAX_CHARS: usize = 1000;
pub const COUNT_RANGE: std::ops::RangeInclusive<f64> = 1.0..=10.0;
pub const MAX_INDUSTRIES: usize = 20;
pub const MAX_INDUSTRY_CHARS: usize = 100;
pub const MAX_TARGET_MARKET_CHARS: usize = 500;
pub const MAX_GEOGRAPHIC_FOCUS_CHARS: usize = 200;
pub const MAX_ADDITIONAL_CONTEXT_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

pub fn validate(payload: &Value) -> ValidationReport {
    let errors = match payload.as_object() {
        Some(fields) => collect_errors(fields),
        None => vec!["request body must be a JSON object".to_string()],
    };
    ValidationReport { valid: errors.is_empty(), errors }
}

/// Validate and convert into the typed request. On failure the full list of
/// problems is returned.
pub fn request_from_payload(payload: &Value) -> Result<GenerationRequest, Vec<String>> {
    let report = validate(payload);
    if !report.valid {
        return Err(report.errors);
    }

    let mut payload = payload.clone();
    if let Some(fields) = payload.as_object_mut() {
        if present(fields, "industries").is_some() {
            fields.remove("interests");
        }
    }
    serde_json::from_value(payload).map_err(|e| vec![format!("invalid request: {e}")])
}

fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

fn collect_errors(fields: &Map<String, Value>) -> Vec<String> {
    let mut errors = Vec::new();

    match present(fields, "prompt") {
        None => errors.push("prompt is required".to_string()),
        Some(Value::String(s)) => {
            let len = s.trim().chars().count();
            if !(PROMPT_MIN_CHARS..=PROMPT_MAX_CHARS).contains(&len) {
                errors.push(format!("prompt must be between {PROMPT_MIN_CHARS} and {PROMPT_MAX_CHARS} characters"));
            }
        }
        Some(_) => errors.push("prompt must be a string".to_string()),
    }

    if let Some(count) = present(fields, "count") {
        match finite_number(count) {
            Some(n) if n.fract() == 0.0 && COUNT_RANGE.contains(&n) => {}
            Some(_) => errors.push("count must be an integer between 1 and 10".to_string()),
            None => errors.push("count must be a number".to_string()),
        }
    }

    // Only one of the two lists is ever used, so only one is checked.
    let industries_key = if present(fields, "industries").is_some() { "industries" } else { "interests" };
    if let Some(list) = present(fields, industries_key) {
        check_string_list(list, industries_key, MAX_INDUSTRIES, MAX_INDUSTRY_CHARS, &mut errors);
    }

    if let Some(list) = present(fields, "ideaTypes") {
        check_tag_list::<IdeaType>(list, "ideaTypes", &mut errors);
    }
    if let Some(list) = present(fields, "businessModels") {
        check_tag_list::<BusinessModel>(list, "businessModels", &mut errors);
    }

    check_text(fields, "targetMarket", MAX_TARGET_MARKET_CHARS, &mut errors);

    if let Some(budget) = present(fields, "budgetRange") {
        check_budget(budget, &mut errors);
    }

    check_tag::<ExperienceLevel>(fields, "experienceLevel", &mut errors);
    check_tag::<RiskAppetite>(fields, "riskAppetite", &mut errors);

    check_text(fields, "geographicFocus", MAX_GEOGRAPHIC_FOCUS_CHARS, &mut errors);
    check_text(fields, "additionalContext", MAX_ADDITIONAL_CONTEXT_CHARS, &mut errors);

    errors
}

/// Numbers only; `"5"` is not a number here.
fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

fn check_text(fields: &Map<String, Value>, key: &str, max_chars: usize, errors: &mut Vec<String>) {
    match present(fields, key) {
        None => {}
        Some(Value::String(s)) if s.chars().count() > max_chars => {
            errors.push(format!("{key} must be at most {max_chars} characters"));
        }
        Some(Value::String(_)) => {}
        Some(_) => errors.push(format!("{key} must be a string")),
    }
}

fn check_string_list(value: &Value, key: &str, max_items: usize, max_chars: usize, errors: &mut Vec<String>) {
    let Some(items) = value.as_array() else {
        errors.push(format!("{key} must be an array of strings"));
        return;
    };
    if items.len() > max_items {
        errors.push(format!("{key} must contain at most {max_items} entries"));
    }
    for item in items {
        match item.as_str() {
            Some(s) if s.chars().count() > max_chars => {
                errors.push(format!("each entry in {key} must be at most {max_chars} characters"));
                break;
            }
            Some(_) => {}
            None => {
                errors.push(format!("{key} must be an array of strings"));
                break;
            }
        }
    }
}

fn check_tag_list<T: Tag>(value: &Value, key: &str, errors: &mut Vec<String>) {
    let Some(items) = value.as_array() else {
        errors.push(format!("{key} must be an array"));
        return;
    };
    for item in items {
        match item.as_str() {
            Some(s) if T::parse(s).is_some() => {}
            Some(s) => errors.push(format!("{key} contains unknown value '{s}', expected one of: {}", T::legal_values())),
            None => errors.push(format!("{key} entries must be strings")),
        }
    }
}

fn check_tag<T: Tag>(fields: &Map<String, Value>, key: &str, errors: &mut Vec<String>) {
    match present(fields, key) {
        None => {}
        Some(Value::String(s)) if T::parse(s).is_some() => {}
        Some(_) => errors.push(format!("{key} must be one of: {}", T::legal_values())),
    }
}

fn check_budget(value: &Value, errors: &mut Vec<String>) {
    let Some(budget) = value.as_object() else {
        errors.push("budgetRange must be an object".to_string());
        return;
    };

    let mut bound = |key: &str| -> Option<f64> {
        match budget.get(key).and_then(finite_number) {
            Some(n) if n < 0.0 => {
                errors.push(format!("budgetRange.{key} must be non-negative"));
                None
            }
            Some(n) => Some(n),
            None => {
                errors.push(format!("budgetRange.{key} must be a number"));
                None
            }
        }
    };
    let min = bound("min");
    let max = bound("max");

    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            errors.push("budgetRange.min must be less than or equal to budgetRange.max".to_string());
        }
    }

    match budget.get("currency").filter(|v| !v.is_null()) {
        None => {}
        Some(Value::String(code)) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {}
        Some(_) => errors.push("budgetRange.currency must be a 3-letter currency code".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn full_request() -> Value {
        json!({
            "prompt": "Sustainable food delivery for students",
            "count": 5,
            "industries": ["food", "logistics"],
            "ideaTypes": ["service", "Platform"],
            "businessModels": ["subscription"],
            "targetMarket": "University students",
            "budgetRange": {"min": 1000, "max": 25000, "currency": "EUR"},
            "experienceLevel": "Intermediate",
            "riskAppetite": "high",
            "geographicFocus": "Western Europe",
            "additionalContext": "Prefer low-waste packaging"
        })
    }

    #[test]
    fn accepts_a_fully_populated_request() {
        let report = validate(&full_request());
        assert_eq!(report, ValidationReport { valid: true, errors: vec![] });
    }

    #[test]
    fn accepts_prompt_only() {
        assert!(validate(&json!({"prompt": "pet care"})).valid);
    }

    #[test]
    fn missing_prompt_is_reported() {
        let report = validate(&json!({"count": 2}));
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("prompt")));
    }

    #[test]
    fn short_and_non_string_prompts_are_rejected() {
        assert_eq!(validate(&json!({"prompt": "ab"})).errors, vec!["prompt must be between 3 and 1000 characters"]);
        assert_eq!(validate(&json!({"prompt": 42})).errors, vec!["prompt must be a string"]);
        let long = "x".repeat(1001);
        assert!(!validate(&json!({"prompt": long})).valid);
    }

    #[test]
    fn count_must_be_an_integer_in_range() {
        assert_eq!(validate(&json!({"prompt": "abc", "count": "5"})).errors, vec!["count must be a number"]);
        assert_eq!(validate(&json!({"prompt": "abc", "count": 0})).errors, vec!["count must be an integer between 1 and 10"]);
        assert_eq!(validate(&json!({"prompt": "abc", "count": 11})).errors, vec!["count must be an integer between 1 and 10"]);
        assert_eq!(validate(&json!({"prompt": "abc", "count": 2.5})).errors, vec!["count must be an integer between 1 and 10"]);
        assert!(validate(&json!({"prompt": "abc", "count": 10})).valid);
    }

    #[test]
    fn inverted_budget_fails_regardless_of_other_fields() {
        let mut payload = full_request();
        payload["budgetRange"] = json!({"min": 500, "max": 100});
        let report = validate(&payload);
        assert_eq!(report.errors, vec!["budgetRange.min must be less than or equal to budgetRange.max"]);

        let report = validate(&json!({"budgetRange": {"min": 500, "max": 100}, "count": 99}));
        assert!(report.errors.contains(&"budgetRange.min must be less than or equal to budgetRange.max".to_string()));
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn budget_bounds_must_be_non_negative_numbers() {
        let report = validate(&json!({"prompt": "abc", "budgetRange": {"min": "10", "max": -1, "currency": "euro"}}));
        assert_eq!(
            report.errors,
            vec![
                "budgetRange.min must be a number",
                "budgetRange.max must be non-negative",
                "budgetRange.currency must be a 3-letter currency code",
            ]
        );
    }

    #[test]
    fn unknown_enum_values_list_the_legal_ones() {
        let report = validate(&json!({"prompt": "abc", "experienceLevel": "expert", "riskAppetite": "YOLO"}));
        assert_eq!(
            report.errors,
            vec![
                "experienceLevel must be one of: beginner, intermediate, advanced",
                "riskAppetite must be one of: low, medium, high",
            ]
        );
        assert!(validate(&json!({"prompt": "abc", "experienceLevel": "ADVANCED"})).valid);
    }

    #[test]
    fn unknown_idea_type_is_rejected() {
        let report = validate(&json!({"prompt": "abc", "ideaTypes": ["software", "vibes"]}));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("ideaTypes contains unknown value 'vibes'"));
    }

    #[test]
    fn list_limits_are_enforced() {
        let many: Vec<String> = (0..21).map(|i| format!("industry {i}")).collect();
        let report = validate(&json!({"prompt": "abc", "industries": many}));
        assert_eq!(report.errors, vec!["industries must contain at most 20 entries"]);

        let report = validate(&json!({"prompt": "abc", "industries": ["y".repeat(101)]}));
        assert_eq!(report.errors, vec!["each entry in industries must be at most 100 characters"]);
    }

    #[test]
    fn industries_shadow_interests() {
        let report = validate(&json!({"prompt": "abc", "industries": ["retail"], "interests": "not a list"}));
        assert!(report.valid);

        let report = validate(&json!({"prompt": "abc", "interests": "not a list"}));
        assert_eq!(report.errors, vec!["interests must be an array of strings"]);
    }

    #[test]
    fn accumulates_every_error() {
        let report = validate(&json!({
            "count": "three",
            "targetMarket": "m".repeat(501),
            "geographicFocus": 12,
            "additionalContext": "c".repeat(2001)
        }));
        assert_eq!(report.errors.len(), 5);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert_eq!(validate(&json!(["prompt"])).errors, vec!["request body must be a JSON object"]);
    }

    #[test]
    fn request_from_payload_normalizes_tags() {
        let mut payload = full_request();
        payload["interests"] = json!([1, 2, 3]);
        let req = request_from_payload(&payload).unwrap();
        assert_eq!(req.idea_types(), &[IdeaType::Service, IdeaType::Platform]);
        assert_eq!(req.experience_level, Some(ExperienceLevel::Intermediate));
        assert_eq!(req.interests, None);
        assert_eq!(req.count(), 5);
    }

    #[test]
    fn request_from_payload_returns_all_errors() {
        let errors = request_from_payload(&json!({"count": 0})).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
