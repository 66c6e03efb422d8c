use serde::{Deserialize, Serialize};

/// A coded clinical item, e.g. a diagnosis. Matching is an exact
/// code + system pair comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedItem {
    pub code: String,
    pub system: String,
    #[serde(default)]
    pub display: Option<String>,
}

/// A numeric range check on a named value in the candidate data bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueRange {
    /// Dotted path into the candidate data, e.g. `labs.egfr`.
    pub field: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Declarative eligibility / exclusion specification.
///
/// A profile with no populated fields matches any candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriteriaProfile {
    #[serde(default)]
    pub min_age: Option<f64>,
    #[serde(default)]
    pub max_age: Option<f64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub required_codes: Vec<CodedItem>,
    #[serde(default)]
    pub optional_codes: Vec<CodedItem>,
    #[serde(default)]
    pub value_ranges: Vec<ValueRange>,
    /// Case-insensitive substrings checked against the candidate's
    /// free-text condition and allergy lists.
    #[serde(default)]
    pub exclusion_terms: Vec<String>,
}

impl CriteriaProfile {
    pub fn is_empty(&self) -> bool {
        self.min_age.is_none()
            && self.max_age.is_none()
            && self.gender.is_none()
            && self.required_codes.is_empty()
            && self.optional_codes.is_empty()
            && self.value_ranges.is_empty()
            && self.exclusion_terms.is_empty()
    }
}
