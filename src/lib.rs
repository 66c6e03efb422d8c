//! # Careflow: a clinical protocol / workflow execution engine
//!
//! `careflow` drives a subject (patient, case, record) through a rule-driven
//! protocol definition: an ordered graph of steps with conditional edges,
//! decision points for clinical judgment, side-effecting actions, and
//! analytics over completed executions. It provides:
//!
//! - **Condition evaluation**: declarative `{field, operator, value}`
//!   conditions over nested JSON data bags; total, never-panicking.
//! - **Eligibility matching**: criteria profiles (age range, gender, coded
//!   items, numeric ranges, exclusion terms) producing met/unmet/exclusion
//!   reports.
//! - **Execution state machine**: start, step completion with required-action
//!   validation and first-match branch resolution, deviations, decisions,
//!   outcome measurements, pause/resume/abandon, idempotent retries.
//! - **Action dispatch**: notify / create-task / create-alert / webhook /
//!   field-update / document actions with `{{path}}` template interpolation,
//!   delivered through pluggable collaborator traits; failures are captured
//!   as data, never aborting the step.
//! - **Analytics**: completion rate, per-step completion, outcome
//!   achievement, and deviation frequency per definition.
//!
//! Definitions and executions live behind repository traits; in-memory
//! reference stores are included for tests and embedding.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use careflow::{
//!     CompleteStep, MemoryDefinitionStore, MemoryExecutionStore, ProtocolEngine,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let definitions = Arc::new(MemoryDefinitionStore::new());
//!     let executions = Arc::new(MemoryExecutionStore::new());
//!     let definition = serde_json::from_str(
//!         &std::fs::read_to_string("protocol.json").unwrap(),
//!     )
//!     .unwrap();
//!     definitions.insert(definition).await;
//!
//!     let engine = ProtocolEngine::builder(definitions, executions).build();
//!     let execution = engine
//!         .start_execution("hta-management", "patient-42", "dr-lin")
//!         .await
//!         .unwrap();
//!     let outcome = engine
//!         .complete_step(CompleteStep {
//!             execution_id: execution.id.clone(),
//!             step_id: "baseline".into(),
//!             actor: "dr-lin".into(),
//!             actions_performed: vec!["measure-bp".into()],
//!             observed_values: serde_json::json!({"systolic": 152}),
//!             notes: None,
//!             idempotency_key: None,
//!         })
//!         .await
//!         .unwrap();
//!     println!("{:?}", outcome.resolution);
//! }
//! ```

pub mod analytics;
pub mod dispatch;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod execution;
pub mod model;
pub mod runtime;
pub mod store;

pub use crate::analytics::{DefinitionAnalytics, DeviationSummary};
pub use crate::dispatch::{
    ActionDispatcher, ActionResult, AlertCreator, AlertRequest, Collaborators, DispatchError,
    DocumentEntry, DocumentWriter, FieldUpdate, FieldUpdater, NoopCollaborator, Notification,
    NotificationSender, TaskCreator, TaskRequest, WebhookCaller, WebhookRequest, WebhookResponse,
};
pub use crate::eligibility::{check_eligibility, EligibilityReport};
pub use crate::engine::{
    CompleteStep, CompleteStepOutcome, ProtocolEngine, ProtocolEngineBuilder, TriggerFiring,
};
pub use crate::error::EngineError;
pub use crate::evaluator::{evaluate, evaluate_condition, Condition, ConditionOperator};
pub use crate::execution::{
    CompletedStep, CompletionReceipt, DecisionRecord, DeviationKind, DeviationRecord, Execution,
    ExecutionStatus, OutcomeMeasurement, RaisedAlert, StepResolution,
};
pub use crate::model::{
    Action, ActionKind, AlertRule, AlertSeverity, CodedItem, CriteriaProfile, DecisionOption,
    DecisionPoint, Definition, DefinitionStatus, NextStepCondition, Outcome, Step, Trigger,
    ValueRange,
};
pub use crate::runtime::{
    FixedTimeProvider, IdGenerator, RuntimeContext, SequentialIdGenerator, SystemTimeProvider,
    TimeProvider, UuidGenerator,
};
pub use crate::store::{
    DefinitionFilter, DefinitionRepository, ExecutionRepository, MemoryDefinitionStore,
    MemoryExecutionStore, StoreError,
};
