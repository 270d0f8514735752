use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use grading::NotationSet;
use grading::criteria::TestPassingCriteria;
use log::debug;
use tokio::sync::RwLock;

use super::{CommitReceipt, TaskStore};
use crate::effect::Effect;
use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{NewTask, ResultStatus, StudentTestResult, Task, Test, TestDraft, User};
use crate::notification::Notification;
use crate::transition::TransitionOutcome;

#[derive(Debug, Default)]
struct State {
    tests: HashMap<i64, Test>,
    tasks: HashMap<i64, Task>,
    users: HashMap<i64, User>,
    results: HashMap<i64, StudentTestResult>,
    outbox: Vec<Notification>,
    last_test_id: i64,
    last_task_id: i64,
    last_user_id: i64,
    last_result_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl State {
    fn result_for(&self, student_id: i64, test_id: i64) -> Option<&StudentTestResult> {
        self.results
            .values()
            .find(|r| r.student_id == student_id && r.test_id == test_id)
    }

    fn spawned_task(&self, spawn: &NewTask) -> Option<&Task> {
        let parent = spawn.spawned_from?;
        self.tasks
            .values()
            .find(|t| t.spawned_from == Some(parent) && t.task_type == spawn.task_type)
    }

    fn insert_task(&mut self, new_task: NewTask) -> WorkflowResult<Task> {
        let test = self
            .tests
            .get_mut(&new_task.test_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("test {}", new_task.test_id)))?;
        let task = new_task.into_task(next_id(&mut self.last_task_id));
        test.attach_task(task.id);
        self.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    fn require_test_version(&self, test_id: i64, expected: i64) -> WorkflowResult<&Test> {
        let test = self
            .tests
            .get(&test_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("test {test_id}")))?;
        if test.version != expected {
            return Err(WorkflowError::StateConflict(format!(
                "test {test_id} changed (version {}, expected {expected})",
                test.version
            )));
        }
        Ok(test)
    }

    fn test_at_version(&mut self, test_id: i64, expected: i64) -> WorkflowResult<&mut Test> {
        self.require_test_version(test_id, expected)?;
        self.tests
            .get_mut(&test_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("test {test_id}")))
    }

    /// Rejects the outcome if any part of it would fail to apply.
    fn check(&self, outcome: &TransitionOutcome) -> WorkflowResult<()> {
        let stored = self
            .tasks
            .get(&outcome.task.id)
            .ok_or_else(|| WorkflowError::NotFound(format!("task {}", outcome.task.id)))?;
        if stored.task_status != outcome.expected_status {
            return Err(WorkflowError::StateConflict(format!(
                "task {} is {}, expected {}",
                stored.id, stored.task_status, outcome.expected_status
            )));
        }
        if let Some(expected) = outcome.expected_test_version {
            self.require_test_version(stored.test_id, expected)?;
        }

        for effect in &outcome.effects {
            match effect {
                Effect::CreateResult(new_result) => {
                    if self
                        .result_for(new_result.student_id, new_result.test_id)
                        .is_some()
                    {
                        return Err(WorkflowError::StateConflict(format!(
                            "a result already exists for student {} on test {}",
                            new_result.student_id, new_result.test_id
                        )));
                    }
                }
                Effect::UpdateResult(result) => {
                    let current = self
                        .results
                        .get(&result.id)
                        .ok_or_else(|| WorkflowError::NotFound(format!("result {}", result.id)))?;
                    if current.student_test_result_status != ResultStatus::Pending {
                        return Err(WorkflowError::StateConflict(format!(
                            "result {} is already {}",
                            current.id, current.student_test_result_status
                        )));
                    }
                }
                Effect::SpawnTask(spawn) => {
                    if !self.tests.contains_key(&spawn.test_id) {
                        return Err(WorkflowError::NotFound(format!("test {}", spawn.test_id)));
                    }
                }
                Effect::PullTaskFromTest { test_id, .. } => {
                    if !self.tests.contains_key(test_id) {
                        return Err(WorkflowError::NotFound(format!("test {test_id}")));
                    }
                }
                Effect::Notify(_) => {}
            }
        }
        Ok(())
    }

    fn apply(&mut self, outcome: TransitionOutcome) -> WorkflowResult<CommitReceipt> {
        let mut spawned = Vec::new();
        let mut result = None;
        let mut notifications = Vec::new();

        for effect in outcome.effects {
            match effect {
                Effect::CreateResult(new_result) => {
                    let created = new_result.into_result(next_id(&mut self.last_result_id));
                    self.results.insert(created.id, created.clone());
                    result = Some(created);
                }
                Effect::UpdateResult(updated) => {
                    self.results.insert(updated.id, updated.clone());
                    result = Some(updated);
                }
                Effect::SpawnTask(spawn) => {
                    if let Some(existing) = self.spawned_task(&spawn) {
                        debug!(
                            "Task {} already spawned {} task {}",
                            existing.spawned_from.unwrap_or_default(),
                            existing.task_type,
                            existing.id
                        );
                        spawned.push(existing.clone());
                    } else {
                        spawned.push(self.insert_task(spawn)?);
                    }
                }
                Effect::PullTaskFromTest { test_id, task_id } => {
                    if let Some(test) = self.tests.get_mut(&test_id) {
                        if !test.pull_task(task_id) {
                            debug!("Task {task_id} was not attached to test {test_id}");
                        }
                    }
                }
                Effect::Notify(notification) => {
                    self.outbox.push(notification.clone());
                    notifications.push(notification);
                }
            }
        }

        let task = outcome.task;
        self.tasks.insert(task.id, task.clone());
        Ok(CommitReceipt {
            task,
            spawned,
            result,
            notifications,
        })
    }
}

/// A [`TaskStore`] kept in process memory behind one lock.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, name: impl Into<String>, email: impl Into<String>) -> User {
        let mut state = self.state.write().await;
        let user = User {
            id: next_id(&mut state.last_user_id),
            name: name.into(),
            email: email.into(),
        };
        state.users.insert(user.id, user.clone());
        user
    }

    /// Takes every notification queued by committed transitions, oldest first.
    pub async fn drain_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut self.state.write().await.outbox)
    }

    /// Every task of a test, deleted ones included, in id order.
    pub async fn tasks_for_test(&self, test_id: i64) -> Vec<Task> {
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.test_id == test_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn find_task(&self, task_id: i64) -> WorkflowResult<Option<Task>> {
        Ok(self.state.read().await.tasks.get(&task_id).cloned())
    }

    async fn find_test(&self, test_id: i64) -> WorkflowResult<Option<Test>> {
        Ok(self.state.read().await.tests.get(&test_id).cloned())
    }

    async fn find_user(&self, user_id: i64) -> WorkflowResult<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_result(
        &self,
        student_id: i64,
        test_id: i64,
    ) -> WorkflowResult<Option<StudentTestResult>> {
        Ok(self
            .state
            .read()
            .await
            .result_for(student_id, test_id)
            .cloned())
    }

    async fn insert_test(&self, draft: TestDraft) -> WorkflowResult<Test> {
        let mut state = self.state.write().await;
        let test = draft.into_test(next_id(&mut state.last_test_id));
        state.tests.insert(test.id, test.clone());
        Ok(test)
    }

    async fn replace_notations(
        &self,
        test_id: i64,
        expected_version: i64,
        notations: NotationSet,
    ) -> WorkflowResult<Test> {
        let mut state = self.state.write().await;
        let test = state.test_at_version(test_id, expected_version)?;
        test.replace_notations(notations);
        Ok(test.clone())
    }

    async fn replace_criteria(
        &self,
        test_id: i64,
        expected_version: i64,
        passing_criteria: Option<TestPassingCriteria>,
    ) -> WorkflowResult<Test> {
        let mut state = self.state.write().await;
        let test = state.test_at_version(test_id, expected_version)?;
        test.replace_criteria(passing_criteria);
        Ok(test.clone())
    }

    async fn insert_task(&self, task: NewTask) -> WorkflowResult<Task> {
        self.state.write().await.insert_task(task)
    }

    async fn commit(&self, outcome: TransitionOutcome) -> WorkflowResult<CommitReceipt> {
        let mut state = self.state.write().await;
        state.check(&outcome)?;
        state.apply(outcome)
    }
}
