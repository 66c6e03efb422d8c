use serde::{Deserialize, Serialize};

/// Execution status. `Completed` and `Abandoned` are terminal; `Paused`
/// can move back to `InProgress` through an explicit resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    InProgress,
    Completed,
    Abandoned,
    Paused,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Abandoned)
    }
}
