use serde::{Deserialize, Serialize};

use crate::models::{NewStudentTestResult, NewTask, StudentTestResult};
use crate::notification::Notification;

/// A side effect requested by a transition. Effects are data; the store applies
/// them together with the task update, or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    /// Insert a result. Rejected if one already exists for (student, test).
    CreateResult(NewStudentTestResult),
    /// Replace a stored result that is still `PENDING` with this version.
    UpdateResult(StudentTestResult),
    /// Insert a task spawned by the transitioning one.
    SpawnTask(NewTask),
    PullTaskFromTest { test_id: i64, task_id: i64 },
    Notify(Notification),
}

impl Effect {
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::CreateResult(_) => "CREATE_RESULT",
            Effect::UpdateResult(_) => "UPDATE_RESULT",
            Effect::SpawnTask(_) => "SPAWN_TASK",
            Effect::PullTaskFromTest { .. } => "PULL_TASK_FROM_TEST",
            Effect::Notify(_) => "NOTIFY",
        }
    }
}
