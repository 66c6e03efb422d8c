use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of side-effecting action types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Notify,
    CreateTask,
    UpdateField,
    CreateAlert,
    CallWebhook,
    Document,
}

/// A typed instruction attached to a step or trigger.
///
/// `config` is a JSON bag whose string leaves may carry `{{field.path}}`
/// placeholders, resolved against the triggering data at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub kind: ActionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub config: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_deserialize_defaults() {
        let action: Action = serde_json::from_value(json!({
            "id": "a1",
            "kind": "notify"
        }))
        .unwrap();
        assert_eq!(action.kind, ActionKind::Notify);
        assert!(!action.required);
        assert!(action.config.is_null());
    }

    #[test]
    fn test_action_kind_snake_case() {
        let kind: ActionKind = serde_json::from_value(json!("call_webhook")).unwrap();
        assert_eq!(kind, ActionKind::CallWebhook);
        assert_eq!(
            serde_json::to_value(ActionKind::CreateTask).unwrap(),
            json!("create_task")
        );
    }
}
