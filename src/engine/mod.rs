//! The protocol execution engine.
//!
//! [`ProtocolEngine`] drives executions through a definition's step graph:
//! it starts executions on the initial step, validates and records step
//! completions, resolves branch conditions, applies clinician decisions and
//! deviations, dispatches side-effecting actions, and answers analytics
//! queries. All state lives behind the repository traits; the engine holds
//! none of its own.

mod protocol_engine;

pub use protocol_engine::{ProtocolEngine, ProtocolEngineBuilder};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::ActionResult;
use crate::execution::{Execution, RaisedAlert, StepResolution};

/// Request to record completion of one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteStep {
    pub execution_id: String,
    pub step_id: String,
    pub actor: String,
    /// Ids of the step's actions the actor performed.
    #[serde(default)]
    pub actions_performed: Vec<String>,
    /// Observations driving branch and alert evaluation.
    #[serde(default)]
    pub observed_values: Value,
    #[serde(default)]
    pub notes: Option<String>,
    /// When set, a retried call with the same key replays the original
    /// outcome instead of double-applying the completion.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// What a step completion did.
///
/// A completion can succeed while individual actions fail; callers must
/// check `action_results` and `raised_alerts` for side-effect failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteStepOutcome {
    pub execution: Execution,
    pub resolution: StepResolution,
    pub action_results: Vec<ActionResult>,
    pub raised_alerts: Vec<RaisedAlert>,
    /// True when this outcome was replayed from an idempotency receipt.
    pub replayed: bool,
}

/// Report of one trigger that fired for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerFiring {
    pub definition_id: String,
    pub trigger_id: String,
    pub action_results: Vec<ActionResult>,
}
