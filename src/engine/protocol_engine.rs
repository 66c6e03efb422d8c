use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::{CompleteStep, CompleteStepOutcome, TriggerFiring};
use crate::dispatch::{ActionDispatcher, AlertRequest, Collaborators};
use crate::eligibility::{check_eligibility, EligibilityReport};
use crate::error::EngineError;
use crate::evaluator::evaluate_condition;
use crate::execution::{
    CompletedStep, CompletionReceipt, DecisionRecord, DeviationKind, DeviationRecord, Execution,
    ExecutionStatus, OutcomeMeasurement, RaisedAlert, StepResolution,
};
use crate::model::{Definition, DefinitionStatus, Step};
use crate::runtime::{IdGenerator, RuntimeContext, TimeProvider};
use crate::store::{DefinitionFilter, DefinitionRepository, ExecutionRepository};
use crate::analytics::{aggregate, DefinitionAnalytics};

/// Builder for [`ProtocolEngine`].
pub struct ProtocolEngineBuilder {
    definitions: Arc<dyn DefinitionRepository>,
    executions: Arc<dyn ExecutionRepository>,
    collaborators: Collaborators,
    runtime: RuntimeContext,
}

impl ProtocolEngineBuilder {
    pub fn collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn time_provider(mut self, time: Arc<dyn TimeProvider>) -> Self {
        self.runtime.time = time;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.runtime.ids = ids;
        self
    }

    pub fn build(self) -> ProtocolEngine {
        ProtocolEngine {
            definitions: self.definitions,
            executions: self.executions,
            dispatcher: ActionDispatcher::new(self.collaborators),
            runtime: self.runtime,
        }
    }
}

/// Rule-driven execution engine over protocol/workflow definitions.
pub struct ProtocolEngine {
    definitions: Arc<dyn DefinitionRepository>,
    executions: Arc<dyn ExecutionRepository>,
    dispatcher: ActionDispatcher,
    runtime: RuntimeContext,
}

impl ProtocolEngine {
    pub fn builder(
        definitions: Arc<dyn DefinitionRepository>,
        executions: Arc<dyn ExecutionRepository>,
    ) -> ProtocolEngineBuilder {
        ProtocolEngineBuilder {
            definitions,
            executions,
            collaborators: Collaborators::noop(),
            runtime: RuntimeContext::default(),
        }
    }

    /// Match a candidate's data against a definition's criteria profile.
    pub async fn check_eligibility(
        &self,
        definition_id: &str,
        candidate: &Value,
    ) -> Result<EligibilityReport, EngineError> {
        let definition = self.load_definition(definition_id).await?;
        Ok(check_eligibility(&definition.criteria, candidate))
    }

    /// Start a new execution of an active definition, positioned on the
    /// step with the lowest order index.
    pub async fn start_execution(
        &self,
        definition_id: &str,
        subject_id: &str,
        actor: &str,
    ) -> Result<Execution, EngineError> {
        let definition = self.load_definition(definition_id).await?;
        if definition.status != DefinitionStatus::Active {
            return Err(EngineError::InvalidState(format!(
                "definition {} is {:?}, executions require an active definition",
                definition_id, definition.status
            )));
        }
        let initial = definition.initial_step().ok_or_else(|| {
            EngineError::Validation(format!("definition {} has no steps", definition_id))
        })?;

        let execution = Execution {
            id: self.runtime.ids.next_id(),
            definition_id: definition.id.clone(),
            definition_version: definition.version,
            subject_id: subject_id.to_string(),
            status: ExecutionStatus::InProgress,
            started_by: actor.to_string(),
            started_at: self.runtime.time.now_unix(),
            completed_at: None,
            abandon_reason: None,
            current_step_id: Some(initial.id.clone()),
            completed_steps: Vec::new(),
            decisions: Vec::new(),
            deviations: Vec::new(),
            outcome_measurements: Vec::new(),
            completion_receipts: Default::default(),
        };
        self.executions.create(execution.clone()).await?;
        info!(
            execution = %execution.id,
            definition = %definition.id,
            subject = %subject_id,
            initial_step = %initial.id,
            "execution started"
        );
        Ok(execution)
    }

    /// Record completion of a step and advance the execution.
    ///
    /// Validation failures leave the execution untouched. The updated
    /// record is persisted before any action is dispatched, so a dispatch
    /// failure can never lose the completion itself.
    pub async fn complete_step(
        &self,
        request: CompleteStep,
    ) -> Result<CompleteStepOutcome, EngineError> {
        let mut execution = self.load_execution(&request.execution_id).await?;

        if let Some(key) = &request.idempotency_key {
            if let Some(receipt) = execution.completion_receipts.get(key) {
                debug!(execution = %execution.id, key = %key, "replaying completion receipt");
                return Ok(CompleteStepOutcome {
                    resolution: receipt.resolution.clone(),
                    action_results: receipt.action_results.clone(),
                    raised_alerts: receipt.raised_alerts.clone(),
                    execution,
                    replayed: true,
                });
            }
        }

        if execution.status != ExecutionStatus::InProgress {
            return Err(EngineError::InvalidState(format!(
                "cannot complete a step on a {:?} execution",
                execution.status
            )));
        }

        let definition = self.load_bound_definition(&execution).await?;
        let step = definition
            .step(&request.step_id)
            .ok_or_else(|| EngineError::StepNotFound {
                definition_id: definition.id.clone(),
                step_id: request.step_id.clone(),
            })?;

        let missing: Vec<String> = step
            .required_action_ids()
            .filter(|id| !request.actions_performed.iter().any(|done| done == id))
            .map(str::to_string)
            .collect();
        if !missing.is_empty()
            && !execution.has_deviation_for(&step.id)
            && !acknowledges_deviation(request.notes.as_deref())
        {
            return Err(EngineError::MissingRequiredActions { missing });
        }

        let now = self.runtime.time.now_unix();
        execution.completed_steps.push(CompletedStep {
            step_id: step.id.clone(),
            completed_at: now,
            completed_by: request.actor.clone(),
            actions_performed: request.actions_performed.clone(),
            observed_values: request.observed_values.clone(),
            notes: request.notes.clone(),
        });

        let resolution = self.resolve_next(&definition, step, &request.observed_values, &mut execution, now)?;
        self.executions.update(execution.clone()).await?;
        info!(
            execution = %execution.id,
            step = %step.id,
            resolution = ?resolution,
            "step completed"
        );

        let data_bag = build_data_bag(&request, &execution);
        let mut action_results = Vec::new();
        for action in &step.actions {
            if request.actions_performed.iter().any(|id| id == &action.id) {
                action_results.push(self.dispatcher.dispatch(action, &data_bag).await);
            }
        }
        let raised_alerts = self.raise_alerts(step, &request.observed_values, &data_bag, &execution).await;

        if let Some(key) = &request.idempotency_key {
            execution.completion_receipts.insert(
                key.clone(),
                CompletionReceipt {
                    step_id: step.id.clone(),
                    resolution: resolution.clone(),
                    action_results: action_results.clone(),
                    raised_alerts: raised_alerts.clone(),
                },
            );
            self.executions.update(execution.clone()).await?;
        }

        Ok(CompleteStepOutcome {
            execution,
            resolution,
            action_results,
            raised_alerts,
            replayed: false,
        })
    }

    /// Record a clinician's selection at a decision point. When the chosen
    /// option carries a `leads_to`, the execution is redirected there as an
    /// explicit, audited override of condition-driven branching.
    pub async fn record_decision(
        &self,
        execution_id: &str,
        decision_point_id: &str,
        option_id: &str,
        actor: &str,
        rationale: Option<String>,
    ) -> Result<Execution, EngineError> {
        let mut execution = self.load_execution(execution_id).await?;
        self.ensure_mutable(&execution)?;
        let definition = self.load_bound_definition(&execution).await?;
        let decision_point = definition
            .decision_point(decision_point_id)
            .ok_or_else(|| EngineError::DecisionPointNotFound(decision_point_id.to_string()))?;
        let option = decision_point
            .options
            .iter()
            .find(|option| option.id == option_id)
            .ok_or_else(|| EngineError::DecisionOptionNotFound {
                decision_point_id: decision_point_id.to_string(),
                option_id: option_id.to_string(),
            })?;

        let redirected_to = match &option.leads_to {
            Some(target) => {
                let target_step =
                    definition
                        .step(target)
                        .ok_or_else(|| EngineError::StepNotFound {
                            definition_id: definition.id.clone(),
                            step_id: target.clone(),
                        })?;
                execution.current_step_id = Some(target_step.id.clone());
                info!(
                    execution = %execution.id,
                    decision_point = %decision_point_id,
                    option = %option_id,
                    target = %target_step.id,
                    "decision redirected execution"
                );
                Some(target_step.id.clone())
            }
            None => None,
        };

        execution.decisions.push(DecisionRecord {
            decision_point_id: decision_point_id.to_string(),
            option_id: option_id.to_string(),
            decided_by: actor.to_string(),
            decided_at: self.runtime.time.now_unix(),
            rationale,
            redirected_to,
        });
        self.executions.update(execution.clone()).await?;
        Ok(execution)
    }

    /// Record a documented departure from a step's prescribed actions.
    /// Deviations are trusted clinical judgment; only the execution lookup
    /// is validated.
    pub async fn record_deviation(
        &self,
        execution_id: &str,
        step_id: &str,
        kind: DeviationKind,
        reason: &str,
        actor: &str,
        approved_by: Option<String>,
    ) -> Result<Execution, EngineError> {
        let mut execution = self.load_execution(execution_id).await?;
        self.ensure_mutable(&execution)?;
        execution.deviations.push(DeviationRecord {
            step_id: step_id.to_string(),
            kind,
            reason: reason.to_string(),
            recorded_by: actor.to_string(),
            recorded_at: self.runtime.time.now_unix(),
            approved_by,
        });
        self.executions.update(execution.clone()).await?;
        Ok(execution)
    }

    /// Record a measurement against one of the definition's outcomes.
    pub async fn record_outcome(
        &self,
        execution_id: &str,
        outcome_id: &str,
        achieved: bool,
        measured_value: Option<Value>,
        actor: &str,
    ) -> Result<Execution, EngineError> {
        let mut execution = self.load_execution(execution_id).await?;
        self.ensure_mutable(&execution)?;
        let definition = self.load_bound_definition(&execution).await?;
        if definition.outcome(outcome_id).is_none() {
            return Err(EngineError::OutcomeNotFound(outcome_id.to_string()));
        }
        execution.outcome_measurements.push(OutcomeMeasurement {
            outcome_id: outcome_id.to_string(),
            achieved,
            measured_value,
            measured_by: actor.to_string(),
            measured_at: self.runtime.time.now_unix(),
        });
        self.executions.update(execution.clone()).await?;
        Ok(execution)
    }

    /// Pause an in-progress execution.
    pub async fn pause(&self, execution_id: &str) -> Result<Execution, EngineError> {
        self.transition(execution_id, ExecutionStatus::InProgress, ExecutionStatus::Paused)
            .await
    }

    /// Resume a paused execution.
    pub async fn resume(&self, execution_id: &str) -> Result<Execution, EngineError> {
        self.transition(execution_id, ExecutionStatus::Paused, ExecutionStatus::InProgress)
            .await
    }

    /// Abandon a non-terminal execution. Requires a reason; irreversible.
    pub async fn abandon(&self, execution_id: &str, reason: &str) -> Result<Execution, EngineError> {
        if reason.trim().is_empty() {
            return Err(EngineError::Validation(
                "abandon requires a non-empty reason".to_string(),
            ));
        }
        let mut execution = self.load_execution(execution_id).await?;
        if execution.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "cannot abandon a {:?} execution",
                execution.status
            )));
        }
        execution.status = ExecutionStatus::Abandoned;
        execution.abandon_reason = Some(reason.to_string());
        execution.current_step_id = None;
        self.executions.update(execution.clone()).await?;
        info!(execution = %execution.id, %reason, "execution abandoned");
        Ok(execution)
    }

    /// Fire an event against every active definition's triggers. A trigger
    /// whose event name matches and whose conditions all hold against the
    /// event data dispatches its actions.
    pub async fn fire_event(
        &self,
        event: &str,
        data: &Value,
    ) -> Result<Vec<TriggerFiring>, EngineError> {
        let definitions = self
            .definitions
            .list(DefinitionFilter {
                status: Some(DefinitionStatus::Active),
            })
            .await?;
        let mut firings = Vec::new();
        for definition in &definitions {
            for trigger in &definition.triggers {
                if trigger.event != event {
                    continue;
                }
                if !trigger
                    .conditions
                    .iter()
                    .all(|condition| evaluate_condition(condition, data))
                {
                    continue;
                }
                let mut action_results = Vec::new();
                for action in &trigger.actions {
                    action_results.push(self.dispatcher.dispatch(action, data).await);
                }
                info!(
                    definition = %definition.id,
                    trigger = %trigger.id,
                    %event,
                    actions = action_results.len(),
                    "trigger fired"
                );
                firings.push(TriggerFiring {
                    definition_id: definition.id.clone(),
                    trigger_id: trigger.id.clone(),
                    action_results,
                });
            }
        }
        Ok(firings)
    }

    /// Aggregate analytics over every execution of a definition.
    pub async fn get_analytics(
        &self,
        definition_id: &str,
    ) -> Result<DefinitionAnalytics, EngineError> {
        let definition = self.load_definition(definition_id).await?;
        let executions = self.executions.list_by_definition(definition_id).await?;
        Ok(aggregate(&definition, &executions))
    }

    // --- internals ---

    async fn load_definition(&self, definition_id: &str) -> Result<Definition, EngineError> {
        self.definitions
            .get_by_id(definition_id)
            .await?
            .ok_or_else(|| EngineError::DefinitionNotFound(definition_id.to_string()))
    }

    /// Load the definition an execution is bound to. Definitions are
    /// immutable, so the id must still resolve to the frozen version.
    async fn load_bound_definition(&self, execution: &Execution) -> Result<Definition, EngineError> {
        let definition = self.load_definition(&execution.definition_id).await?;
        if definition.version != execution.definition_version {
            return Err(EngineError::InvalidState(format!(
                "execution {} is bound to definition {} v{}, store holds v{}",
                execution.id, definition.id, execution.definition_version, definition.version
            )));
        }
        Ok(definition)
    }

    async fn load_execution(&self, execution_id: &str) -> Result<Execution, EngineError> {
        self.executions
            .get_by_id(execution_id)
            .await?
            .ok_or_else(|| EngineError::ExecutionNotFound(execution_id.to_string()))
    }

    fn ensure_mutable(&self, execution: &Execution) -> Result<(), EngineError> {
        if execution.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "execution {} is {:?} and immutable",
                execution.id, execution.status
            )));
        }
        Ok(())
    }

    /// Pick the next step: first matching condition wins, then the default
    /// edge; with no edge resolved, complete the execution if every
    /// required step is done, else clear the pointer for manual
    /// resolution.
    fn resolve_next(
        &self,
        definition: &Definition,
        step: &Step,
        observed: &Value,
        execution: &mut Execution,
        now: i64,
    ) -> Result<StepResolution, EngineError> {
        let matched = step
            .next_conditions
            .iter()
            .find(|edge| evaluate_condition(&edge.condition, observed))
            .map(|edge| edge.next_step_id.clone());
        let next = matched.or_else(|| step.default_next.clone());

        if let Some(next_id) = next {
            let target = definition
                .step(&next_id)
                .ok_or_else(|| EngineError::StepNotFound {
                    definition_id: definition.id.clone(),
                    step_id: next_id.clone(),
                })?;
            execution.current_step_id = Some(target.id.clone());
            return Ok(StepResolution::Advanced(target.id.clone()));
        }

        let all_required_done = definition
            .steps
            .iter()
            .filter(|candidate| candidate.required)
            .all(|candidate| execution.has_completed(&candidate.id));
        execution.current_step_id = None;
        if all_required_done {
            execution.status = ExecutionStatus::Completed;
            execution.completed_at = Some(now);
            Ok(StepResolution::Completed)
        } else {
            Ok(StepResolution::AwaitingManualResolution)
        }
    }

    async fn raise_alerts(
        &self,
        step: &Step,
        observed: &Value,
        data_bag: &Value,
        execution: &Execution,
    ) -> Vec<RaisedAlert> {
        let mut raised = Vec::new();
        for rule in &step.alert_rules {
            if !evaluate_condition(&rule.condition, observed) {
                continue;
            }
            let message = crate::dispatch::interpolate(&rule.message, data_bag);
            let delivery = self
                .dispatcher
                .raise_alert(AlertRequest {
                    severity: rule.severity,
                    message: message.clone(),
                    subject_id: Some(execution.subject_id.clone()),
                })
                .await;
            raised.push(match delivery {
                Ok(()) => RaisedAlert {
                    severity: rule.severity,
                    message,
                    delivered: true,
                    error: None,
                },
                Err(error) => RaisedAlert {
                    severity: rule.severity,
                    message,
                    delivered: false,
                    error: Some(error.to_string()),
                },
            });
        }
        raised
    }

    async fn transition(
        &self,
        execution_id: &str,
        from: ExecutionStatus,
        to: ExecutionStatus,
    ) -> Result<Execution, EngineError> {
        let mut execution = self.load_execution(execution_id).await?;
        if execution.status != from {
            return Err(EngineError::InvalidState(format!(
                "execution {} is {:?}, expected {:?}",
                execution_id, execution.status, from
            )));
        }
        execution.status = to;
        self.executions.update(execution.clone()).await?;
        info!(execution = %execution_id, from = ?from, to = ?to, "execution transitioned");
        Ok(execution)
    }
}

/// Caller acknowledgment of a known deviation, carried in completion
/// notes when no deviation record has been filed yet.
fn acknowledges_deviation(notes: Option<&str>) -> bool {
    notes.is_some_and(|notes| notes.to_lowercase().contains("deviation"))
}

/// Dispatch data bag: the observed values at the top level, with the
/// execution context nested under `context` so templates like
/// `{{riskScore}}` keep working.
fn build_data_bag(request: &CompleteStep, execution: &Execution) -> Value {
    let mut bag = match &request.observed_values {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    let mut context = Map::new();
    context.insert("execution_id".into(), Value::String(execution.id.clone()));
    context.insert("subject_id".into(), Value::String(execution.subject_id.clone()));
    context.insert("step_id".into(), Value::String(request.step_id.clone()));
    context.insert("actor".into(), Value::String(request.actor.clone()));
    bag.insert("context".into(), Value::Object(context));
    Value::Object(bag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledges_deviation() {
        assert!(acknowledges_deviation(Some("Deviation recorded: stock-out")));
        assert!(acknowledges_deviation(Some("known deviation")));
        assert!(!acknowledges_deviation(Some("all fine")));
        assert!(!acknowledges_deviation(None));
    }

    #[test]
    fn test_build_data_bag_preserves_observed_and_nests_context() {
        let request = CompleteStep {
            execution_id: "e1".into(),
            step_id: "s1".into(),
            actor: "dr-lin".into(),
            actions_performed: vec![],
            observed_values: serde_json::json!({"riskScore": 72}),
            notes: None,
            idempotency_key: None,
        };
        let execution: Execution = serde_json::from_value(serde_json::json!({
            "id": "e1",
            "definition_id": "d1",
            "definition_version": 1,
            "subject_id": "p1",
            "status": "in_progress",
            "started_by": "dr-lin",
            "started_at": 0
        }))
        .unwrap();
        let bag = build_data_bag(&request, &execution);
        assert_eq!(bag["riskScore"], 72);
        assert_eq!(bag["context"]["subject_id"], "p1");
        assert_eq!(bag["context"]["step_id"], "s1");
    }
}
