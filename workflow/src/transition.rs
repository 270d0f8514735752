//! Task lifecycle state machine.
//!
//! [`apply_transition`] is pure: given a task, the requested [`Transition`] and a
//! [`TransitionContext`] holding everything the engine fetched beforehand, it returns the
//! updated task and the [`Effect`]s to apply, or an error and nothing else. The store then
//! commits the outcome atomically, re-checking the task status it was computed against.
//!
//! | Transition        | Required type      | Required status                 |
//! |-------------------|--------------------|---------------------------------|
//! | `AssignCorrector` | `ASSIGN_CORRECTOR` | `PENDING` / `IN_PROGRESS`       |
//! | `EnterMarks`      | `ENTER_MARKS`      | `PENDING` / `IN_PROGRESS`       |
//! | `ValidateMarks`   | `VALIDATE_MARKS`   | `PENDING` / `IN_PROGRESS`       |
//! | `Update`          | any                | not `DELETED`                   |
//! | `Delete`          | any                | not `DELETED`                   |

use chrono::{DateTime, Utc};
use grading::aggregator::validate_marks;
use grading::{compute_average_and_outcome, Mark};
use validator::Validate;

use crate::effect::Effect;
use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{
    CreateTask, NewStudentTestResult, NewTask, ResultStatus, StudentTestResult, Task, TaskStatus,
    TaskType, TaskUpdate, Test, User,
};
use crate::notification::{Notification, NotificationSettings};

/// A requested change to one task.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Only an open task can be assigned; a `COMPLETED` one already spawned its marking task.
    AssignCorrector {
        corrector_id: i64,
        due_date: Option<DateTime<Utc>>,
    },
    EnterMarks {
        student_id: i64,
        marks: Vec<Mark>,
    },
    ValidateMarks,
    Update(TaskUpdate),
    Delete,
}

impl Transition {
    pub fn kind(&self) -> &'static str {
        match self {
            Transition::AssignCorrector { .. } => "ASSIGN_CORRECTOR",
            Transition::EnterMarks { .. } => "ENTER_MARKS",
            Transition::ValidateMarks => "VALIDATE_MARKS",
            Transition::Update(_) => "UPDATE_TASK",
            Transition::Delete => "DELETE_TASK",
        }
    }
}

/// Inputs fetched by the engine before a transition is applied.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    pub actor_id: i64,
    pub now: DateTime<Utc>,
    /// The task's test.
    pub test: Option<Test>,
    /// The user the transition assigns work to (corrector or new assignee).
    pub user: Option<User>,
    /// The stored result for the (student, test) pair the task concerns.
    pub existing_result: Option<StudentTestResult>,
    pub notifications: NotificationSettings,
}

impl TransitionContext {
    pub fn new(actor_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            actor_id,
            now,
            test: None,
            user: None,
            existing_result: None,
            notifications: NotificationSettings::default(),
        }
    }

    pub fn with_test(mut self, test: Test) -> Self {
        self.test = Some(test);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_existing_result(mut self, result: StudentTestResult) -> Self {
        self.existing_result = Some(result);
        self
    }

    pub fn with_notifications(mut self, settings: NotificationSettings) -> Self {
        self.notifications = settings;
        self
    }

    fn require_test(&self, task: &Task) -> WorkflowResult<&Test> {
        self.test
            .as_ref()
            .filter(|t| t.id == task.test_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("test {}", task.test_id)))
    }

    fn require_user(&self, user_id: i64) -> WorkflowResult<&User> {
        self.user
            .as_ref()
            .filter(|u| u.id == user_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("user {user_id}")))
    }
}

/// The result of a successful transition, ready to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub task: Task,
    /// Status the stored task must still have when the outcome is committed.
    pub expected_status: TaskStatus,
    /// Definition version of the test the transition was checked against, when the
    /// outcome depends on the test's notations or criteria.
    pub expected_test_version: Option<i64>,
    pub effects: Vec<Effect>,
}

/// Applies `transition` to `task`.
pub fn apply_transition(
    task: &Task,
    transition: Transition,
    ctx: &TransitionContext,
) -> WorkflowResult<TransitionOutcome> {
    let mut updated = task.clone();
    let mut effects = Vec::new();
    let mut expected_test_version = None;

    match transition {
        Transition::AssignCorrector {
            corrector_id,
            due_date,
        } => {
            require_open(task, TaskType::AssignCorrector)?;
            let test = ctx.require_test(task)?;
            let corrector = ctx.require_user(corrector_id)?;

            updated.complete(ctx.actor_id, ctx.now);
            effects.push(Effect::SpawnTask(NewTask {
                test_id: task.test_id,
                user_id: corrector_id,
                student_id: task.student_id,
                task_type: TaskType::EnterMarks,
                due_date,
                spawned_from: Some(task.id),
                created_by: ctx.actor_id,
                created_at: ctx.now,
            }));
            effects.push(Effect::Notify(Notification::corrector_assigned(
                &ctx.notifications,
                corrector,
                test,
                due_date,
            )));
        }

        Transition::EnterMarks { student_id, marks } => {
            require_open(task, TaskType::EnterMarks)?;
            let test = ctx.require_test(task)?;
            if student_id < 1 {
                return Err(WorkflowError::validation(
                    "student_id",
                    "student_id must be a positive id",
                ));
            }
            if let Some(expected) = task.student_id.filter(|id| *id != student_id) {
                return Err(WorkflowError::validation(
                    "student_id",
                    format!("task concerns student {expected}, not {student_id}"),
                ));
            }
            validate_marks(&marks, &test.notations)?;
            if ctx.existing_result.is_some() {
                return Err(WorkflowError::StateConflict(format!(
                    "a result already exists for student {student_id} on test {}",
                    task.test_id
                )));
            }

            let assessment = compute_average_and_outcome(&marks, test.passing_criteria.as_ref());
            expected_test_version = Some(test.version);
            updated.student_id = Some(student_id);
            updated.complete(ctx.actor_id, ctx.now);
            effects.push(Effect::CreateResult(NewStudentTestResult {
                student_id,
                test_id: task.test_id,
                marks,
                average_mark: assessment.average_mark,
                outcome: assessment.outcome,
                entered_by: ctx.actor_id,
                entered_at: ctx.now,
            }));
            // Validation goes back to whoever assigned the marking.
            effects.push(Effect::SpawnTask(NewTask {
                test_id: task.test_id,
                user_id: task.created_by,
                student_id: Some(student_id),
                task_type: TaskType::ValidateMarks,
                due_date: None,
                spawned_from: Some(task.id),
                created_by: ctx.actor_id,
                created_at: ctx.now,
            }));
        }

        Transition::ValidateMarks => {
            require_open(task, TaskType::ValidateMarks)?;
            let student_id = task.student_id.ok_or_else(|| {
                WorkflowError::validation("student_id", "task does not concern a student")
            })?;
            let result = ctx
                .existing_result
                .as_ref()
                .filter(|r| r.student_id == student_id && r.test_id == task.test_id)
                .ok_or_else(|| {
                    WorkflowError::NotFound(format!(
                        "result for student {student_id} on test {}",
                        task.test_id
                    ))
                })?;
            if result.student_test_result_status != ResultStatus::Pending {
                return Err(WorkflowError::StateConflict(format!(
                    "result {} is already {}",
                    result.id, result.student_test_result_status
                )));
            }

            let mut validated = result.clone();
            validated.mark_validated(ctx.actor_id, ctx.now);
            updated.complete(ctx.actor_id, ctx.now);
            effects.push(Effect::UpdateResult(validated));
        }

        Transition::Update(update) => {
            require_not_deleted(task)?;
            if update.is_empty() {
                return Err(WorkflowError::validation("update", "no fields to update"));
            }
            if let Some(status) = update.task_status {
                if !status.is_open() {
                    return Err(WorkflowError::validation(
                        "task_status",
                        "only PENDING or IN_PROGRESS may be set on a task",
                    ));
                }
                if task.task_status == TaskStatus::Completed {
                    return Err(WorkflowError::StateConflict(format!(
                        "task {} is COMPLETED and cannot be reopened",
                        task.id
                    )));
                }
                updated.task_status = status;
            }
            if let Some(user_id) = update.user_id {
                ctx.require_user(user_id)?;
                updated.user_id = user_id;
            }
            if let Some(due_date) = update.due_date {
                updated.due_date = Some(due_date);
            }
            updated.touch(ctx.actor_id, ctx.now);
        }

        Transition::Delete => {
            require_not_deleted(task)?;
            updated.soft_delete(ctx.actor_id, ctx.now);
            effects.push(Effect::PullTaskFromTest {
                test_id: task.test_id,
                task_id: task.id,
            });
        }
    }

    Ok(TransitionOutcome {
        task: updated,
        expected_status: task.task_status,
        expected_test_version,
        effects,
    })
}

/// Plans a new task from a creation request after checking its references.
pub fn plan_task(
    request: CreateTask,
    actor_id: i64,
    now: DateTime<Utc>,
    test: Option<&Test>,
    user: Option<&User>,
) -> WorkflowResult<NewTask> {
    if let Err(errors) = request.validate() {
        let field = common::first_invalid_field(&errors).unwrap_or_else(|| "request".into());
        return Err(WorkflowError::validation(
            field,
            common::format_validation_errors(&errors),
        ));
    }
    if request.task_type == TaskType::ValidateMarks && request.student_id.is_none() {
        return Err(WorkflowError::validation(
            "student_id",
            "VALIDATE_MARKS tasks must name a student",
        ));
    }
    if test.filter(|t| t.id == request.test_id).is_none() {
        return Err(WorkflowError::NotFound(format!("test {}", request.test_id)));
    }
    if user.filter(|u| u.id == request.user_id).is_none() {
        return Err(WorkflowError::NotFound(format!("user {}", request.user_id)));
    }

    Ok(NewTask {
        test_id: request.test_id,
        user_id: request.user_id,
        student_id: request.student_id,
        task_type: request.task_type,
        due_date: request.due_date,
        spawned_from: None,
        created_by: actor_id,
        created_at: now,
    })
}

fn require_open(task: &Task, task_type: TaskType) -> WorkflowResult<()> {
    if task.task_type != task_type {
        return Err(WorkflowError::StateConflict(format!(
            "task {} is a {} task, not {}",
            task.id, task.task_type, task_type
        )));
    }
    if !task.task_status.is_open() {
        return Err(WorkflowError::StateConflict(format!(
            "task {} is {}",
            task.id, task.task_status
        )));
    }
    Ok(())
}

fn require_not_deleted(task: &Task) -> WorkflowResult<()> {
    if task.task_status == TaskStatus::Deleted {
        return Err(WorkflowError::StateConflict(format!(
            "task {} is DELETED",
            task.id
        )));
    }
    Ok(())
}
