//! Async service tying the pure grading logic and task transitions to a [`TaskStore`].
//!
//! Every task operation follows the same steps: load the task and whatever the transition
//! depends on, capture the current time, run [`apply_transition`], and commit the outcome.
//! A failure at any step leaves the store untouched.

use chrono::{DateTime, Utc};
use common::config::Config;
use grading::criteria::PassingCriteriaInput;
use grading::{revalidate_passing_criteria, validate_passing_criteria, Mark, Notation, NotationSet};
use log::{info, warn};

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{CreateTask, Task, TaskUpdate, Test, TestDraft};
use crate::notification::NotificationSettings;
use crate::store::{CommitReceipt, TaskStore};
use crate::transition::{apply_transition, plan_task, Transition, TransitionContext};

pub struct WorkflowEngine<S: TaskStore> {
    store: S,
    notifications: NotificationSettings,
}

impl<S: TaskStore> WorkflowEngine<S> {
    pub fn new(store: S, notifications: NotificationSettings) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Builds an engine whose notifications follow the loaded configuration.
    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(store, NotificationSettings::from(config))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and stores a new test definition.
    pub async fn define_test(
        &self,
        name: &str,
        notations: Vec<Notation>,
        criteria: Option<PassingCriteriaInput>,
    ) -> WorkflowResult<Test> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkflowError::validation("name", "test name is required"));
        }
        let notations = NotationSet::new(notations)?;
        let passing_criteria = criteria
            .map(|input| validate_passing_criteria(&input, &notations))
            .transpose()?;

        let test = self
            .store
            .insert_test(TestDraft {
                name: name.to_string(),
                notations,
                passing_criteria,
            })
            .await?;
        info!(
            "Defined test {} '{}' ({} notations, {} points)",
            test.id,
            test.name,
            test.notations.len(),
            test.notations.total_points()
        );
        Ok(test)
    }

    /// Replaces a test's passing criteria; `None` removes them.
    ///
    /// The criteria are validated against the notations read here; a notation update that
    /// lands before the write turns this into a `StateConflict`.
    pub async fn set_passing_criteria(
        &self,
        test_id: i64,
        criteria: Option<PassingCriteriaInput>,
    ) -> WorkflowResult<Test> {
        let test = self.load_test(test_id).await?;
        let passing_criteria = criteria
            .map(|input| validate_passing_criteria(&input, &test.notations))
            .transpose()?;

        let test = self
            .store
            .replace_criteria(test_id, test.version, passing_criteria)
            .await
            .inspect_err(|err| warn!("Passing criteria update of test {test_id} rejected: {err}"))?;
        info!("Updated passing criteria of test {test_id}");
        Ok(test)
    }

    /// Replaces a test's notations, rejecting sets that orphan existing criteria.
    ///
    /// Fails with `StateConflict` if the definition changed since it was read.
    pub async fn update_notations(
        &self,
        test_id: i64,
        notations: Vec<Notation>,
    ) -> WorkflowResult<Test> {
        let test = self.load_test(test_id).await?;
        let notations = NotationSet::new(notations)?;
        if let Some(criteria) = &test.passing_criteria {
            if let Err(err) = revalidate_passing_criteria(criteria, &notations) {
                warn!("Rejected notation update for test {test_id}: {err}");
                return Err(err.into());
            }
        }

        let test = self
            .store
            .replace_notations(test_id, test.version, notations)
            .await
            .inspect_err(|err| warn!("Notation update of test {test_id} rejected: {err}"))?;
        info!(
            "Updated notations of test {test_id} ({} notations)",
            test.notations.len()
        );
        Ok(test)
    }

    pub async fn create_task(&self, actor_id: i64, request: CreateTask) -> WorkflowResult<Task> {
        let test = self.store.find_test(request.test_id).await?;
        let user = self.store.find_user(request.user_id).await?;
        let planned = plan_task(request, actor_id, Utc::now(), test.as_ref(), user.as_ref())
            .inspect_err(|err| warn!("Rejected task creation by user {actor_id}: {err}"))?;

        let task = self.store.insert_task(planned).await?;
        info!(
            "Created {} task {} on test {} for user {}",
            task.task_type, task.id, task.test_id, task.user_id
        );
        Ok(task)
    }

    pub async fn assign_corrector(
        &self,
        actor_id: i64,
        task_id: i64,
        corrector_id: i64,
        due_date: Option<DateTime<Utc>>,
    ) -> WorkflowResult<CommitReceipt> {
        self.run(
            actor_id,
            task_id,
            Transition::AssignCorrector {
                corrector_id,
                due_date,
            },
        )
        .await
    }

    pub async fn enter_marks(
        &self,
        actor_id: i64,
        task_id: i64,
        student_id: i64,
        marks: Vec<Mark>,
    ) -> WorkflowResult<CommitReceipt> {
        self.run(actor_id, task_id, Transition::EnterMarks { student_id, marks })
            .await
    }

    pub async fn validate_marks(
        &self,
        actor_id: i64,
        task_id: i64,
    ) -> WorkflowResult<CommitReceipt> {
        self.run(actor_id, task_id, Transition::ValidateMarks).await
    }

    pub async fn update_task(
        &self,
        actor_id: i64,
        task_id: i64,
        update: TaskUpdate,
    ) -> WorkflowResult<Task> {
        Ok(self
            .run(actor_id, task_id, Transition::Update(update))
            .await?
            .task)
    }

    pub async fn delete_task(&self, actor_id: i64, task_id: i64) -> WorkflowResult<Task> {
        Ok(self.run(actor_id, task_id, Transition::Delete).await?.task)
    }

    async fn load_test(&self, test_id: i64) -> WorkflowResult<Test> {
        self.store
            .find_test(test_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("test {test_id}")))
    }

    async fn run(
        &self,
        actor_id: i64,
        task_id: i64,
        transition: Transition,
    ) -> WorkflowResult<CommitReceipt> {
        let kind = transition.kind();
        let result = self.try_run(actor_id, task_id, transition).await;
        match &result {
            Ok(receipt) => info!(
                "{kind} on task {task_id} by user {actor_id}: task now {}, {} spawned",
                receipt.task.task_status,
                receipt.spawned.len()
            ),
            Err(err) => warn!("{kind} on task {task_id} by user {actor_id} rejected: {err}"),
        }
        result
    }

    async fn try_run(
        &self,
        actor_id: i64,
        task_id: i64,
        transition: Transition,
    ) -> WorkflowResult<CommitReceipt> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("task {task_id}")))?;

        let mut ctx = TransitionContext::new(actor_id, Utc::now())
            .with_notifications(self.notifications.clone());
        if let Some(test) = self.store.find_test(task.test_id).await? {
            ctx = ctx.with_test(test);
        }

        let user_id = match &transition {
            Transition::AssignCorrector { corrector_id, .. } => Some(*corrector_id),
            Transition::Update(update) => update.user_id,
            _ => None,
        };
        if let Some(user) = match user_id {
            Some(id) => self.store.find_user(id).await?,
            None => None,
        } {
            ctx = ctx.with_user(user);
        }

        let student_id = match &transition {
            Transition::EnterMarks { student_id, .. } => Some(*student_id),
            Transition::ValidateMarks => task.student_id,
            _ => None,
        };
        if let Some(result) = match student_id {
            Some(id) => self.store.find_result(id, task.test_id).await?,
            None => None,
        } {
            ctx = ctx.with_existing_result(result);
        }

        let outcome = apply_transition(&task, transition, &ctx)?;
        self.store.commit(outcome).await
    }
}
