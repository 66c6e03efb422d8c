use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::operators;
use super::path;

/// Operators available to declarative conditions. The set is closed and
/// exhaustively matched: adding an operator is a compile-time decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    In,
    NotIn,
    Exists,
}

/// A single declarative condition against a data bag field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted path into the data bag, e.g. `vitals.bp.systolic`.
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
}

/// Evaluate an operator against an already-resolved field value.
///
/// `value` is `None` when the field path did not resolve. Evaluation is
/// total: every mismatch is `false`, never an error.
pub fn evaluate(value: Option<&Value>, operator: ConditionOperator, target: &Value) -> bool {
    let present = match value {
        Some(v) if !v.is_null() => Some(v),
        _ => None,
    };
    if operator == ConditionOperator::Exists {
        return present.is_some();
    }
    let Some(value) = present else {
        return false;
    };
    match operator {
        ConditionOperator::Eq => operators::loose_eq(value, target),
        ConditionOperator::Neq => !operators::loose_eq(value, target),
        ConditionOperator::Gt => operators::compare_numeric(value, target, |a, b| a > b),
        ConditionOperator::Lt => operators::compare_numeric(value, target, |a, b| a < b),
        ConditionOperator::Gte => operators::compare_numeric(value, target, |a, b| a >= b),
        ConditionOperator::Lte => operators::compare_numeric(value, target, |a, b| a <= b),
        ConditionOperator::Contains => operators::contains(value, target),
        ConditionOperator::In => operators::in_sequence(value, target),
        ConditionOperator::NotIn => target.is_array() && !operators::in_sequence(value, target),
        ConditionOperator::Exists => false,
    }
}

/// Resolve a condition's field in `data` and evaluate it.
pub fn evaluate_condition(condition: &Condition, data: &Value) -> bool {
    let value = path::lookup(data, &condition.field);
    evaluate(value, condition.operator, &condition.value)
}
