use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    AssignCorrector,
    EnterMarks,
    ValidateMarks,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    /// Soft-deleted; the record is kept for audit.
    Deleted,
}

impl TaskStatus {
    /// Work can still be done on the task.
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

/// One unit of grading work on a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub test_id: i64,
    /// Assignee.
    pub user_id: i64,
    /// Student whose marks the task concerns, when it concerns one.
    pub student_id: Option<i64>,
    pub task_type: TaskType,
    pub task_status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    /// The task whose completion created this one.
    pub spawned_from: Option<i64>,
    pub completed_by: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
    pub deleted_by: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    pub(crate) fn touch(&mut self, actor_id: i64, now: DateTime<Utc>) {
        self.updated_by = actor_id;
        self.updated_at = now;
    }

    pub(crate) fn complete(&mut self, actor_id: i64, now: DateTime<Utc>) {
        self.task_status = TaskStatus::Completed;
        self.completed_by = Some(actor_id);
        self.completed_at = Some(now);
        self.touch(actor_id, now);
    }

    pub(crate) fn soft_delete(&mut self, actor_id: i64, now: DateTime<Utc>) {
        self.task_status = TaskStatus::Deleted;
        self.completed_by = None;
        self.completed_at = None;
        self.deleted_by = Some(actor_id);
        self.deleted_at = Some(now);
        self.touch(actor_id, now);
    }
}

/// Task creation request as received from the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(range(min = 1, message = "test_id must be a positive id"))]
    pub test_id: i64,
    #[validate(range(min = 1, message = "user_id must be a positive id"))]
    pub user_id: i64,
    #[validate(range(min = 1, message = "student_id must be a positive id"))]
    pub student_id: Option<i64>,
    pub task_type: TaskType,
    pub due_date: Option<DateTime<Utc>>,
}

/// A task that has been planned but not stored yet; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub test_id: i64,
    pub user_id: i64,
    pub student_id: Option<i64>,
    pub task_type: TaskType,
    pub due_date: Option<DateTime<Utc>>,
    pub spawned_from: Option<i64>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    /// Materializes the task in `PENDING` under the id chosen by the store.
    pub fn into_task(self, id: i64) -> Task {
        Task {
            id,
            test_id: self.test_id,
            user_id: self.user_id,
            student_id: self.student_id,
            task_type: self.task_type,
            task_status: TaskStatus::Pending,
            due_date: self.due_date,
            spawned_from: self.spawned_from,
            completed_by: None,
            completed_at: None,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_by: self.created_by,
            updated_at: self.created_at,
            deleted_by: None,
            deleted_at: None,
        }
    }
}

/// Partial update of a task. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub user_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    /// Only `PENDING` and `IN_PROGRESS` may be set this way.
    pub task_status: Option<TaskStatus>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.due_date.is_none() && self.task_status.is_none()
    }
}
