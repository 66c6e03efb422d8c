use crate::store::StoreError;
use thiserror::Error;

/// Engine-level errors.
///
/// The taxonomy is deliberately small: lookups fail with a `*NotFound`
/// variant, caller mistakes fail with [`EngineError::Validation`] or
/// [`EngineError::MissingRequiredActions`], and operations that are not
/// legal in the execution's current status fail with
/// [`EngineError::InvalidState`]. Nothing is retried internally.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Definition not found: {0}")]
    DefinitionNotFound(String),
    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),
    #[error("Step not found: {step_id} in definition {definition_id}")]
    StepNotFound {
        definition_id: String,
        step_id: String,
    },
    #[error("Decision point not found: {0}")]
    DecisionPointNotFound(String),
    #[error("Decision option not found: {option_id} on decision point {decision_point_id}")]
    DecisionOptionNotFound {
        decision_point_id: String,
        option_id: String,
    },
    #[error("Outcome not found: {0}")]
    OutcomeNotFound(String),
    #[error("Required actions not performed: {}", .missing.join(", "))]
    MissingRequiredActions { missing: Vec<String> },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether this error is a lookup failure (unknown id).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::DefinitionNotFound(_)
                | EngineError::ExecutionNotFound(_)
                | EngineError::StepNotFound { .. }
                | EngineError::DecisionPointNotFound(_)
                | EngineError::DecisionOptionNotFound { .. }
                | EngineError::OutcomeNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        assert_eq!(
            EngineError::DefinitionNotFound("d1".into()).to_string(),
            "Definition not found: d1"
        );
        assert_eq!(
            EngineError::ExecutionNotFound("e1".into()).to_string(),
            "Execution not found: e1"
        );
        assert_eq!(
            EngineError::StepNotFound {
                definition_id: "d1".into(),
                step_id: "s9".into()
            }
            .to_string(),
            "Step not found: s9 in definition d1"
        );
        assert_eq!(
            EngineError::MissingRequiredActions {
                missing: vec!["a1".into(), "a2".into()]
            }
            .to_string(),
            "Required actions not performed: a1, a2"
        );
        assert_eq!(
            EngineError::Validation("empty reason".into()).to_string(),
            "Validation error: empty reason"
        );
        assert_eq!(
            EngineError::InvalidState("already completed".into()).to_string(),
            "Invalid state: already completed"
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err: EngineError = StoreError::Storage("disk gone".into()).into();
        assert_eq!(err.to_string(), "Storage error: disk gone");
    }

    #[test]
    fn test_is_not_found() {
        assert!(EngineError::DefinitionNotFound("d".into()).is_not_found());
        assert!(EngineError::OutcomeNotFound("o".into()).is_not_found());
        assert!(!EngineError::Validation("v".into()).is_not_found());
        assert!(!EngineError::InvalidState("s".into()).is_not_found());
    }
}
