use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::ActionResult;
use crate::model::AlertSeverity;

/// Append-only record of one step completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedStep {
    pub step_id: String,
    pub completed_at: i64,
    pub completed_by: String,
    /// Ids of the step actions the actor actually performed.
    #[serde(default)]
    pub actions_performed: Vec<String>,
    /// Data observed at completion; drives branch and alert evaluation.
    #[serde(default)]
    pub observed_values: Value,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A recorded human selection at a decision point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision_point_id: String,
    pub option_id: String,
    pub decided_by: String,
    pub decided_at: i64,
    #[serde(default)]
    pub rationale: Option<String>,
    /// Step the execution was redirected to, when the selected option
    /// carried a `leads_to`. The redirect is explicit and audited.
    #[serde(default)]
    pub redirected_to: Option<String>,
}

/// Documented departure from a step's prescribed actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationKind {
    Omission,
    Modification,
    Addition,
    Timing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationRecord {
    pub step_id: String,
    pub kind: DeviationKind,
    pub reason: String,
    pub recorded_by: String,
    pub recorded_at: i64,
    #[serde(default)]
    pub approved_by: Option<String>,
}

/// Measurement against a definition outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeMeasurement {
    pub outcome_id: String,
    pub achieved: bool,
    #[serde(default)]
    pub measured_value: Option<Value>,
    pub measured_by: String,
    pub measured_at: i64,
}

/// Where a step completion left the execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "step_id")]
pub enum StepResolution {
    /// Walk advanced to the given step.
    Advanced(String),
    /// Every required step is complete and the last step had no outgoing
    /// edges; the execution is done.
    Completed,
    /// The step had no outgoing edges but required steps remain; the
    /// current-step pointer is cleared and the caller must resolve.
    AwaitingManualResolution,
}

/// Alert raised by a step's alert rules during completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaisedAlert {
    pub severity: AlertSeverity,
    /// Message with `{{path}}` tokens already interpolated.
    pub message: String,
    pub delivered: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Outcome of an applied `complete_step`, stored against its idempotency
/// token so a retried call replays instead of double-applying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReceipt {
    pub step_id: String,
    pub resolution: StepResolution,
    #[serde(default)]
    pub action_results: Vec<ActionResult>,
    #[serde(default)]
    pub raised_alerts: Vec<RaisedAlert>,
}
