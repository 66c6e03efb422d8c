//! Aggregate analytics over a definition's executions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::execution::{DeviationKind, Execution, ExecutionStatus};
use crate::model::Definition;

/// Deviations grouped by kind, with the distinct reasons observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationSummary {
    pub kind: DeviationKind,
    pub count: usize,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionAnalytics {
    pub definition_id: String,
    pub executions: usize,
    /// Completed executions over all executions; 0 when there are none.
    pub completion_rate: f64,
    /// Per step id: share of executions with a completed-step entry.
    pub step_completion_rates: HashMap<String, f64>,
    /// Per outcome id: share of completed executions that achieved it.
    pub outcome_achievement: HashMap<String, f64>,
    /// Sorted by frequency, most common first.
    pub common_deviations: Vec<DeviationSummary>,
}

/// Compute analytics for `definition` over `executions`. Every ratio is 0
/// when its denominator is empty.
pub fn aggregate(definition: &Definition, executions: &[Execution]) -> DefinitionAnalytics {
    let total = executions.len();
    let completed: Vec<&Execution> = executions
        .iter()
        .filter(|execution| execution.status == ExecutionStatus::Completed)
        .collect();

    let completion_rate = ratio(completed.len(), total);

    let step_completion_rates = definition
        .steps
        .iter()
        .map(|step| {
            let count = executions
                .iter()
                .filter(|execution| execution.has_completed(&step.id))
                .count();
            (step.id.clone(), ratio(count, total))
        })
        .collect();

    let outcome_achievement = definition
        .outcomes
        .iter()
        .map(|outcome| {
            let achieved = completed
                .iter()
                .filter(|execution| {
                    execution
                        .outcome_measurements
                        .iter()
                        .any(|m| m.outcome_id == outcome.id && m.achieved)
                })
                .count();
            (outcome.id.clone(), ratio(achieved, completed.len()))
        })
        .collect();

    let mut grouped: Vec<DeviationSummary> = Vec::new();
    for execution in executions {
        for deviation in &execution.deviations {
            match grouped.iter_mut().find(|s| s.kind == deviation.kind) {
                Some(summary) => {
                    summary.count += 1;
                    if !summary.reasons.contains(&deviation.reason) {
                        summary.reasons.push(deviation.reason.clone());
                    }
                }
                None => grouped.push(DeviationSummary {
                    kind: deviation.kind,
                    count: 1,
                    reasons: vec![deviation.reason.clone()],
                }),
            }
        }
    }
    grouped.sort_by(|a, b| b.count.cmp(&a.count));

    DefinitionAnalytics {
        definition_id: definition.id.clone(),
        executions: total,
        completion_rate,
        step_completion_rates,
        outcome_achievement,
        common_deviations: grouped,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
