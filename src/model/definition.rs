use serde::{Deserialize, Serialize};

use super::{Action, CriteriaProfile, Step};
use crate::error::EngineError;
use crate::evaluator::Condition;

/// Lifecycle status of a definition. Only `Active` definitions can start
/// new executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionStatus {
    Draft,
    PendingApproval,
    Active,
    Suspended,
    Retired,
}

impl DefinitionStatus {
    /// Legal lifecycle moves: draft → pending_approval → active,
    /// active ⇄ suspended, and retire from any non-retired state.
    pub fn can_transition_to(self, next: DefinitionStatus) -> bool {
        use DefinitionStatus::*;
        match (self, next) {
            (Draft, PendingApproval) => true,
            (PendingApproval, Active) | (PendingApproval, Draft) => true,
            (Active, Suspended) | (Suspended, Active) => true,
            (Retired, _) => false,
            (_, Retired) => true,
            _ => false,
        }
    }
}

/// One selectable option at a decision point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub label: String,
    /// Eligibility hint for this option; informational, never enforced.
    #[serde(default)]
    pub criteria: Option<CriteriaProfile>,
    /// Step to move the execution to when this option is selected.
    #[serde(default)]
    pub leads_to: Option<String>,
}

/// A definition-level fork requiring human selection among labeled
/// options, used where a step's own conditions are insufficient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPoint {
    pub id: String,
    pub question: String,
    pub options: Vec<DecisionOption>,
}

/// A measurable goal of the protocol, reported against by
/// outcome measurements on executions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub id: String,
    pub description: String,
}

/// An event-driven rule: when a named event fires and every condition
/// holds against the event data, the trigger's actions are dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub id: String,
    pub event: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Immutable protocol/workflow template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    pub id: String,
    pub name: String,
    pub version: u32,
    pub status: DefinitionStatus,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub decision_points: Vec<DecisionPoint>,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    /// Target population; includes exclusion terms.
    #[serde(default)]
    pub criteria: CriteriaProfile,
}

impl Definition {
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == step_id)
    }

    /// The step with the lowest order index, where executions start.
    pub fn initial_step(&self) -> Option<&Step> {
        self.steps.iter().min_by_key(|step| step.order)
    }

    pub fn decision_point(&self, decision_point_id: &str) -> Option<&DecisionPoint> {
        self.decision_points
            .iter()
            .find(|dp| dp.id == decision_point_id)
    }

    pub fn outcome(&self, outcome_id: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|outcome| outcome.id == outcome_id)
    }

    /// Validated lifecycle move; illegal transitions are `InvalidState`.
    pub fn transition_status(&mut self, next: DefinitionStatus) -> Result<(), EngineError> {
        if !self.status.can_transition_to(next) {
            return Err(EngineError::InvalidState(format!(
                "definition {} cannot move from {:?} to {:?}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}
