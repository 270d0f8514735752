//! Persistence seam for the workflow engine.
//!
//! The engine only reads through [`TaskStore`] and writes through [`TaskStore::commit`],
//! which applies a task update and all of its effects as one unit.

pub mod memory;

use async_trait::async_trait;
use grading::NotationSet;
use grading::criteria::TestPassingCriteria;

use crate::error::WorkflowResult;
use crate::models::{NewTask, StudentTestResult, Task, Test, TestDraft, User};
use crate::notification::Notification;
use crate::transition::TransitionOutcome;

pub use memory::InMemoryStore;

/// What a commit actually changed.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    pub task: Task,
    /// Tasks spawned by the commit, including ones an earlier commit already spawned.
    pub spawned: Vec<Task>,
    /// The result created or updated by the commit.
    pub result: Option<StudentTestResult>,
    pub notifications: Vec<Notification>,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_task(&self, task_id: i64) -> WorkflowResult<Option<Task>>;

    async fn find_test(&self, test_id: i64) -> WorkflowResult<Option<Test>>;

    async fn find_user(&self, user_id: i64) -> WorkflowResult<Option<User>>;

    async fn find_result(
        &self,
        student_id: i64,
        test_id: i64,
    ) -> WorkflowResult<Option<StudentTestResult>>;

    async fn insert_test(&self, draft: TestDraft) -> WorkflowResult<Test>;

    /// Replaces a test's notations if its definition is still at `expected_version`.
    ///
    /// Fails with `StateConflict` and changes nothing when another update got there first.
    async fn replace_notations(
        &self,
        test_id: i64,
        expected_version: i64,
        notations: NotationSet,
    ) -> WorkflowResult<Test>;

    /// Replaces a test's passing criteria if its definition is still at `expected_version`.
    async fn replace_criteria(
        &self,
        test_id: i64,
        expected_version: i64,
        passing_criteria: Option<TestPassingCriteria>,
    ) -> WorkflowResult<Test>;

    /// Stores a new task and attaches it to its test's task list.
    async fn insert_task(&self, task: NewTask) -> WorkflowResult<Task>;

    /// Applies `outcome` atomically.
    ///
    /// Fails with `StateConflict` and changes nothing when the stored task no longer has
    /// `outcome.expected_status`, the task's test has moved past
    /// `outcome.expected_test_version`, or an effect conflicts with stored data.
    async fn commit(&self, outcome: TransitionOutcome) -> WorkflowResult<CommitReceipt>;
}
