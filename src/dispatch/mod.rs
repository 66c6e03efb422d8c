//! Side-effecting action dispatch.
//!
//! The dispatcher interpolates an action's config against the triggering
//! data and hands it to the matching collaborator. Delivery is
//! fire-and-collect-result: every failure (malformed config, transport
//! error, non-2xx webhook status) is downgraded to an [`ActionResult`]
//! with `success = false`, and one action's failure never aborts the step
//! or the execution.

pub mod template;

pub use template::{interpolate, interpolate_config};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Action, ActionKind, AlertSeverity};

/// Transport-level failure raised by a collaborator. The dispatcher
/// downgrades these to failure results; they never propagate.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Rejected by receiver: {0}")]
    Rejected(String),
}

/// Result of dispatching one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: String,
    pub kind: ActionKind,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ActionResult {
    fn ok(action: &Action) -> Self {
        Self {
            action_id: action.id.clone(),
            kind: action.kind,
            success: true,
            error: None,
        }
    }

    fn failed(action: &Action, error: impl Into<String>) -> Self {
        Self {
            action_id: action.id.clone(),
            kind: action.kind,
            success: false,
            error: Some(error.into()),
        }
    }
}

// --- Collaborator interfaces ---

#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub recipient: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskRequest {
    pub title: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub detail: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertRequest {
    #[serde(default = "default_alert_severity")]
    pub severity: AlertSeverity,
    pub message: String,
    #[serde(default)]
    pub subject_id: Option<String>,
}

fn default_alert_severity() -> AlertSeverity {
    AlertSeverity::Warning
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRequest {
    pub url: String,
    #[serde(default = "default_webhook_method")]
    pub method: String,
    #[serde(default)]
    pub body: Value,
}

fn default_webhook_method() -> String {
    "POST".to_string()
}

/// Response from a webhook call; any non-2xx status is a per-action
/// failure.
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldUpdate {
    #[serde(default)]
    pub subject_id: Option<String>,
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentEntry {
    #[serde(default)]
    pub subject_id: Option<String>,
    pub content: String,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), DispatchError>;
}

#[async_trait]
pub trait TaskCreator: Send + Sync {
    async fn create(&self, task: TaskRequest) -> Result<(), DispatchError>;
}

#[async_trait]
pub trait AlertCreator: Send + Sync {
    async fn create(&self, alert: AlertRequest) -> Result<(), DispatchError>;
}

#[async_trait]
pub trait WebhookCaller: Send + Sync {
    async fn call(&self, request: WebhookRequest) -> Result<WebhookResponse, DispatchError>;
}

#[async_trait]
pub trait FieldUpdater: Send + Sync {
    async fn update(&self, update: FieldUpdate) -> Result<(), DispatchError>;
}

#[async_trait]
pub trait DocumentWriter: Send + Sync {
    async fn write(&self, entry: DocumentEntry) -> Result<(), DispatchError>;
}

/// The external collaborators the dispatcher delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub notifications: Arc<dyn NotificationSender>,
    pub tasks: Arc<dyn TaskCreator>,
    pub alerts: Arc<dyn AlertCreator>,
    pub webhooks: Arc<dyn WebhookCaller>,
    pub fields: Arc<dyn FieldUpdater>,
    pub documents: Arc<dyn DocumentWriter>,
}

impl Collaborators {
    /// Collaborators that accept and drop everything; useful for tests and
    /// embedding before real integrations exist.
    pub fn noop() -> Self {
        let sink = Arc::new(NoopCollaborator);
        Self {
            notifications: sink.clone(),
            tasks: sink.clone(),
            alerts: sink.clone(),
            webhooks: sink.clone(),
            fields: sink.clone(),
            documents: sink,
        }
    }
}

/// Accepts every request and does nothing.
pub struct NoopCollaborator;

#[async_trait]
impl NotificationSender for NoopCollaborator {
    async fn send(&self, notification: Notification) -> Result<(), DispatchError> {
        debug!(recipient = %notification.recipient, "noop notification");
        Ok(())
    }
}

#[async_trait]
impl TaskCreator for NoopCollaborator {
    async fn create(&self, task: TaskRequest) -> Result<(), DispatchError> {
        debug!(title = %task.title, "noop task");
        Ok(())
    }
}

#[async_trait]
impl AlertCreator for NoopCollaborator {
    async fn create(&self, alert: AlertRequest) -> Result<(), DispatchError> {
        debug!(message = %alert.message, "noop alert");
        Ok(())
    }
}

#[async_trait]
impl WebhookCaller for NoopCollaborator {
    async fn call(&self, request: WebhookRequest) -> Result<WebhookResponse, DispatchError> {
        debug!(url = %request.url, "noop webhook");
        Ok(WebhookResponse {
            status: 200,
            body: None,
        })
    }
}

#[async_trait]
impl FieldUpdater for NoopCollaborator {
    async fn update(&self, update: FieldUpdate) -> Result<(), DispatchError> {
        debug!(field = %update.field, "noop field update");
        Ok(())
    }
}

#[async_trait]
impl DocumentWriter for NoopCollaborator {
    async fn write(&self, entry: DocumentEntry) -> Result<(), DispatchError> {
        debug!(len = entry.content.len(), "noop document");
        Ok(())
    }
}

/// Executes typed actions against the collaborator interfaces.
pub struct ActionDispatcher {
    collaborators: Collaborators,
}

impl ActionDispatcher {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Interpolate the action's config against `data` and deliver it.
    pub async fn dispatch(&self, action: &Action, data: &Value) -> ActionResult {
        let config = interpolate_config(&action.config, data);
        debug!(action = %action.id, kind = ?action.kind, "dispatching action");
        let delivery = match action.kind {
            ActionKind::Notify => match decode::<Notification>(&config) {
                Ok(notification) => self.collaborators.notifications.send(notification).await,
                Err(error) => return ActionResult::failed(action, error),
            },
            ActionKind::CreateTask => match decode::<TaskRequest>(&config) {
                Ok(task) => self.collaborators.tasks.create(task).await,
                Err(error) => return ActionResult::failed(action, error),
            },
            ActionKind::CreateAlert => match decode::<AlertRequest>(&config) {
                Ok(alert) => self.collaborators.alerts.create(alert).await,
                Err(error) => return ActionResult::failed(action, error),
            },
            ActionKind::CallWebhook => match decode::<WebhookRequest>(&config) {
                Ok(request) => match self.collaborators.webhooks.call(request).await {
                    Ok(response) if (200..300).contains(&response.status) => Ok(()),
                    Ok(response) => Err(DispatchError::Rejected(format!(
                        "webhook returned status {}",
                        response.status
                    ))),
                    Err(error) => Err(error),
                },
                Err(error) => return ActionResult::failed(action, error),
            },
            ActionKind::UpdateField => match decode::<FieldUpdate>(&config) {
                Ok(update) => self.collaborators.fields.update(update).await,
                Err(error) => return ActionResult::failed(action, error),
            },
            ActionKind::Document => match decode::<DocumentEntry>(&config) {
                Ok(entry) => self.collaborators.documents.write(entry).await,
                Err(error) => return ActionResult::failed(action, error),
            },
        };
        match delivery {
            Ok(()) => ActionResult::ok(action),
            Err(error) => {
                warn!(action = %action.id, %error, "action dispatch failed");
                ActionResult::failed(action, error.to_string())
            }
        }
    }

    /// Raise an alert outside of a typed action (step alert rules).
    pub async fn raise_alert(&self, alert: AlertRequest) -> Result<(), DispatchError> {
        self.collaborators.alerts.create(alert).await
    }
}

fn decode<T: serde::de::DeserializeOwned>(config: &Value) -> Result<T, String> {
    serde_json::from_value(config.clone()).map_err(|e| format!("invalid action config: {}", e))
}
