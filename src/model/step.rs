use serde::{Deserialize, Serialize};

use super::Action;
use crate::evaluator::Condition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// A condition evaluated against a step's observed values; a match raises
/// an alert through the alert collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub condition: Condition,
    pub severity: AlertSeverity,
    /// May carry `{{path}}` placeholders resolved against observed values.
    pub message: String,
}

/// A conditional outgoing edge. Evaluated in declaration order against the
/// observed values submitted with step completion; first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextStepCondition {
    pub condition: Condition,
    pub next_step_id: String,
}

/// An atomic unit of work within a definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub title: String,
    /// Position in the definition; the lowest order is the initial step.
    pub order: u32,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub alert_rules: Vec<AlertRule>,
    #[serde(default)]
    pub next_conditions: Vec<NextStepCondition>,
    /// Fallback edge when no condition matches. `None` together with empty
    /// `next_conditions` means the step may be terminal.
    #[serde(default)]
    pub default_next: Option<String>,
}

impl Step {
    /// Step has no outgoing edges at all.
    pub fn is_terminal(&self) -> bool {
        self.next_conditions.is_empty() && self.default_next.is_none()
    }

    /// Ids of actions flagged required.
    pub fn required_action_ids(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .filter(|action| action.required)
            .map(|action| action.id.as_str())
    }
}
