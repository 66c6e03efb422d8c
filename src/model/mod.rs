//! Definition-side data model.
//!
//! A [`Definition`] is an immutable template: ordered steps with
//! conditional edges, decision points, outcomes, triggers, and a target
//! criteria profile. Executions reference a definition by id + version and
//! never mutate it.

mod action;
mod criteria;
mod definition;
mod step;

pub use action::{Action, ActionKind};
pub use criteria::{CodedItem, CriteriaProfile, ValueRange};
pub use definition::{
    DecisionOption, DecisionPoint, Definition, DefinitionStatus, Outcome, Trigger,
};
pub use step::{AlertRule, AlertSeverity, NextStepCondition, Step};
