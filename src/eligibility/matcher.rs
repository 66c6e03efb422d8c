use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::evaluator::operators::to_number;
use crate::evaluator::path;
use crate::model::{CodedItem, CriteriaProfile};

/// Result of matching a candidate against a criteria profile.
///
/// `eligible` is true iff `unmet` and `exclusions` are both empty. Any
/// exclusion hit forces ineligibility regardless of the met list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub eligible: bool,
    pub met: Vec<String>,
    pub unmet: Vec<String>,
    pub exclusions: Vec<String>,
}

/// Match `candidate` against `profile`.
///
/// Absent profile fields are vacuously satisfied; an entirely empty
/// profile matches any candidate.
pub fn check_eligibility(profile: &CriteriaProfile, candidate: &Value) -> EligibilityReport {
    let mut met = Vec::new();
    let mut unmet = Vec::new();
    let mut exclusions = Vec::new();

    let age = path::lookup(candidate, "age").and_then(to_number);
    if let Some(min) = profile.min_age {
        match age {
            Some(age) if age >= min => met.push(format!("age >= {}", min)),
            _ => unmet.push(format!("age >= {}", min)),
        }
    }
    if let Some(max) = profile.max_age {
        match age {
            Some(age) if age <= max => met.push(format!("age <= {}", max)),
            _ => unmet.push(format!("age <= {}", max)),
        }
    }

    if let Some(gender) = &profile.gender {
        let candidate_gender = path::lookup(candidate, "gender").and_then(Value::as_str);
        if candidate_gender.is_some_and(|g| g.eq_ignore_ascii_case(gender)) {
            met.push(format!("gender = {}", gender));
        } else {
            unmet.push(format!("gender = {}", gender));
        }
    }

    let candidate_codes = coded_items(candidate);
    for required in &profile.required_codes {
        if has_code(&candidate_codes, required) {
            met.push(code_label(required));
        } else {
            unmet.push(code_label(required));
        }
    }
    // Optional codes enrich the met list but never count against the
    // candidate when absent.
    for optional in &profile.optional_codes {
        if has_code(&candidate_codes, optional) {
            met.push(code_label(optional));
        }
    }

    for range in &profile.value_ranges {
        let value = path::lookup(candidate, &range.field).and_then(to_number);
        let label = range_label(&range.field, range.min, range.max);
        let within = value.is_some_and(|v| {
            range.min.is_none_or(|min| v >= min) && range.max.is_none_or(|max| v <= max)
        });
        if within {
            met.push(label);
        } else {
            unmet.push(label);
        }
    }

    for term in &profile.exclusion_terms {
        let needle = term.to_lowercase();
        for list in ["conditions", "allergies"] {
            let Some(Value::Array(entries)) = path::lookup(candidate, list) else {
                continue;
            };
            for entry in entries {
                if let Some(text) = entry.as_str() {
                    if text.to_lowercase().contains(&needle) {
                        exclusions.push(format!("{}: {}", term, text));
                    }
                }
            }
        }
    }

    EligibilityReport {
        eligible: unmet.is_empty() && exclusions.is_empty(),
        met,
        unmet,
        exclusions,
    }
}

fn coded_items(candidate: &Value) -> Vec<CodedItem> {
    match path::lookup(candidate, "codes") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn has_code(candidate_codes: &[CodedItem], wanted: &CodedItem) -> bool {
    candidate_codes
        .iter()
        .any(|item| item.code == wanted.code && item.system == wanted.system)
}

fn code_label(item: &CodedItem) -> String {
    format!("code {} ({})", item.code, item.system)
}

fn range_label(field: &str, min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{} in {}..{}", field, min, max),
        (Some(min), None) => format!("{} >= {}", field, min),
        (None, Some(max)) => format!("{} <= {}", field, max),
        (None, None) => format!("{} present", field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_profile_matches_anyone() {
        let report = check_eligibility(&CriteriaProfile::default(), &json!({}));
        assert!(report.eligible);
        assert!(report.met.is_empty());
        assert!(report.unmet.is_empty());
        assert!(report.exclusions.is_empty());
    }

    #[test]
    fn test_age_range() {
        let profile: CriteriaProfile = serde_json::from_value(json!({
            "min_age": 18, "max_age": 80
        }))
        .unwrap();
        let report = check_eligibility(&profile, &json!({"age": 52}));
        assert!(report.eligible);
        assert_eq!(report.met, vec!["age >= 18", "age <= 80"]);

        let report = check_eligibility(&profile, &json!({"age": 17}));
        assert!(!report.eligible);
        assert_eq!(report.unmet, vec!["age >= 18"]);

        // Missing age fails a specified range.
        let report = check_eligibility(&profile, &json!({}));
        assert!(!report.eligible);
        assert_eq!(report.unmet.len(), 2);
    }

    #[test]
    fn test_gender_case_insensitive() {
        let profile: CriteriaProfile =
            serde_json::from_value(json!({"gender": "female"})).unwrap();
        assert!(check_eligibility(&profile, &json!({"gender": "Female"})).eligible);
        assert!(!check_eligibility(&profile, &json!({"gender": "male"})).eligible);
        assert!(!check_eligibility(&profile, &json!({})).eligible);
    }

    #[test]
    fn test_required_codes_exact_pair() {
        let profile: CriteriaProfile = serde_json::from_value(json!({
            "required_codes": [{"code": "I10", "system": "ICD-10"}]
        }))
        .unwrap();
        let candidate = json!({"codes": [{"code": "I10", "system": "ICD-10"}]});
        let report = check_eligibility(&profile, &candidate);
        assert!(report.eligible);
        assert_eq!(report.met, vec!["code I10 (ICD-10)"]);

        // Same code under another system does not match.
        let candidate = json!({"codes": [{"code": "I10", "system": "ICD-9"}]});
        let report = check_eligibility(&profile, &candidate);
        assert!(!report.eligible);
        assert_eq!(report.unmet, vec!["code I10 (ICD-10)"]);
    }

    #[test]
    fn test_optional_codes_never_unmet() {
        let profile: CriteriaProfile = serde_json::from_value(json!({
            "optional_codes": [{"code": "E11.9", "system": "ICD-10"}]
        }))
        .unwrap();
        let report = check_eligibility(&profile, &json!({}));
        assert!(report.eligible);
        assert!(report.unmet.is_empty());

        let candidate = json!({"codes": [{"code": "E11.9", "system": "ICD-10"}]});
        let report = check_eligibility(&profile, &candidate);
        assert_eq!(report.met, vec!["code E11.9 (ICD-10)"]);
    }

    #[test]
    fn test_value_ranges_with_dotted_path() {
        let profile: CriteriaProfile = serde_json::from_value(json!({
            "value_ranges": [{"field": "labs.egfr", "min": 30}]
        }))
        .unwrap();
        assert!(check_eligibility(&profile, &json!({"labs": {"egfr": 45}})).eligible);
        let report = check_eligibility(&profile, &json!({"labs": {"egfr": 12}}));
        assert!(!report.eligible);
        assert_eq!(report.unmet, vec!["labs.egfr >= 30"]);
    }

    #[test]
    fn test_exclusions_force_ineligible() {
        let profile: CriteriaProfile = serde_json::from_value(json!({
            "exclusion_terms": ["pregnancy", "ACE inhibitor"]
        }))
        .unwrap();
        let candidate = json!({
            "conditions": ["Early pregnancy"],
            "allergies": ["ace inhibitor rash"]
        });
        let report = check_eligibility(&profile, &candidate);
        assert!(!report.eligible);
        assert_eq!(report.exclusions.len(), 2);
        // Exclusion wins even when everything else is met.
        assert!(report.unmet.is_empty());
    }
}
