//! Execution-side data model.
//!
//! An [`Execution`] is one running (or finished) instance of a definition
//! bound to a subject. It is mutated only through the engine's operations
//! and becomes immutable once its status is terminal.

mod record;
mod status;

pub use record::{
    CompletedStep, CompletionReceipt, DecisionRecord, DeviationKind, DeviationRecord,
    OutcomeMeasurement, RaisedAlert, StepResolution,
};
pub use status::ExecutionStatus;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One running/completed instance of a definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    /// Bound definition, frozen at start. Later definition edits never
    /// affect an in-flight execution.
    pub definition_id: String,
    pub definition_version: u32,
    pub subject_id: String,
    pub status: ExecutionStatus,
    pub started_by: String,
    pub started_at: i64,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub abandon_reason: Option<String>,
    /// Always references a step of the bound definition; empty only while
    /// the status is terminal or the walk awaits manual resolution.
    #[serde(default)]
    pub current_step_id: Option<String>,
    #[serde(default)]
    pub completed_steps: Vec<CompletedStep>,
    #[serde(default)]
    pub decisions: Vec<DecisionRecord>,
    #[serde(default)]
    pub deviations: Vec<DeviationRecord>,
    #[serde(default)]
    pub outcome_measurements: Vec<OutcomeMeasurement>,
    /// Applied idempotency tokens and the outcomes they produced.
    #[serde(default)]
    pub completion_receipts: HashMap<String, CompletionReceipt>,
}

impl Execution {
    /// Whether a completed-step entry exists for `step_id`.
    pub fn has_completed(&self, step_id: &str) -> bool {
        self.completed_steps
            .iter()
            .any(|entry| entry.step_id == step_id)
    }

    /// Whether a deviation has been recorded against `step_id`.
    pub fn has_deviation_for(&self, step_id: &str) -> bool {
        self.deviations
            .iter()
            .any(|deviation| deviation.step_id == step_id)
    }
}
