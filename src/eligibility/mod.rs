//! Criteria profile matching.
//!
//! Evaluates a [`CriteriaProfile`](crate::model::CriteriaProfile) against a
//! candidate data bag, producing the met/unmet criteria and any exclusion
//! hits. The candidate bag uses a small set of conventional keys:
//!
//! - `age`: number
//! - `gender`: string
//! - `codes`: array of `{code, system}` coded items
//! - `conditions`, `allergies`: arrays of free-text strings
//!
//! plus whatever named values the profile's range checks reference by
//! dotted path.

mod matcher;

pub use matcher::{check_eligibility, EligibilityReport};
