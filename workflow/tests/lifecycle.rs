use std::sync::Arc;

use chrono::{Duration, Utc};
use common::config::Config;
use grading::criteria::{
    ConditionInput, CriteriaBranchInput, CriteriaGroupInput, PassingCriteriaInput,
};
use grading::{Mark, Notation, Outcome};
use workflow::models::{CreateTask, ResultStatus, TaskStatus, TaskType, TaskUpdate, Test, User};
use workflow::{InMemoryStore, TaskStore, WorkflowEngine, WorkflowError};

struct Fixture {
    engine: WorkflowEngine<InMemoryStore>,
    admin: User,
    corrector: User,
    test: Test,
}

fn mark_condition(notation: &str, op: &str, mark: f64) -> ConditionInput {
    ConditionInput {
        criteria_type: "MARK".into(),
        comparison_operator: op.into(),
        mark,
        notation_text: Some(notation.into()),
    }
}

fn branch(conditions: Vec<ConditionInput>) -> CriteriaBranchInput {
    CriteriaBranchInput {
        test_criteria_groups: vec![CriteriaGroupInput { conditions }],
    }
}

async fn fixture() -> Fixture {
    let store = InMemoryStore::new();
    let admin = store.add_user("Admin", "admin@example.com").await;
    let corrector = store.add_user("Corrector", "corrector@example.com").await;
    let config = Config {
        email_from_name: "Exams Office".into(),
        frontend_url: "https://grades.example.com/".into(),
        ..Config::default()
    };
    let engine = WorkflowEngine::from_config(store, &config);

    let criteria = PassingCriteriaInput {
        pass_criteria: Some(branch(vec![mark_condition("A", "GTE", 5.0)])),
        fail_criteria: Some(branch(vec![mark_condition("A", "LT", 5.0)])),
    };
    let test = engine
        .define_test(
            "Anatomy practical",
            vec![Notation::new("A", 10.0), Notation::new("B", 20.0)],
            Some(criteria),
        )
        .await
        .unwrap();

    Fixture {
        engine,
        admin,
        corrector,
        test,
    }
}

async fn assignment_task(f: &Fixture) -> i64 {
    f.engine
        .create_task(
            f.admin.id,
            CreateTask {
                test_id: f.test.id,
                user_id: f.admin.id,
                student_id: None,
                task_type: TaskType::AssignCorrector,
                due_date: None,
            },
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn full_lifecycle_from_assignment_to_validation() {
    let f = fixture().await;
    let assign_id = assignment_task(&f).await;
    let due = Utc::now() + Duration::days(7);

    let assigned = f
        .engine
        .assign_corrector(f.admin.id, assign_id, f.corrector.id, Some(due))
        .await
        .unwrap();
    assert_eq!(assigned.task.task_status, TaskStatus::Completed);
    let enter_task = &assigned.spawned[0];
    assert_eq!(enter_task.task_type, TaskType::EnterMarks);
    assert_eq!(enter_task.user_id, f.corrector.id);
    assert_eq!(enter_task.due_date, Some(due));

    let entered = f
        .engine
        .enter_marks(
            f.corrector.id,
            enter_task.id,
            42,
            vec![Mark::new("A", 3.0), Mark::new("B", 15.0)],
        )
        .await
        .unwrap();
    let result = entered.result.clone().unwrap();
    assert_eq!(result.average_mark, 9.0);
    assert_eq!(result.outcome, Outcome::Fail);
    assert_eq!(result.student_test_result_status, ResultStatus::Pending);
    let validate_task = &entered.spawned[0];
    assert_eq!(validate_task.task_type, TaskType::ValidateMarks);
    assert_eq!(validate_task.student_id, Some(42));

    let validated = f
        .engine
        .validate_marks(f.admin.id, validate_task.id)
        .await
        .unwrap();
    assert_eq!(validated.task.task_status, TaskStatus::Completed);
    let stored = f
        .engine
        .store()
        .find_result(42, f.test.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.student_test_result_status, ResultStatus::Validated);
    assert!(stored.mark_validated_date.is_some());

    let test = f.engine.store().find_test(f.test.id).await.unwrap().unwrap();
    assert_eq!(test.task_ids, vec![assign_id, enter_task.id, validate_task.id]);
}

#[tokio::test]
async fn validating_twice_is_a_conflict() {
    let f = fixture().await;
    let task = f
        .engine
        .create_task(
            f.admin.id,
            CreateTask {
                test_id: f.test.id,
                user_id: f.corrector.id,
                student_id: None,
                task_type: TaskType::EnterMarks,
                due_date: None,
            },
        )
        .await
        .unwrap();
    let entered = f
        .engine
        .enter_marks(f.corrector.id, task.id, 5, vec![Mark::new("A", 8.0)])
        .await
        .unwrap();
    let validate_id = entered.spawned[0].id;

    f.engine.validate_marks(f.admin.id, validate_id).await.unwrap();
    let err = f
        .engine
        .validate_marks(f.admin.id, validate_id)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn entering_marks_for_a_student_with_a_result_is_a_conflict() {
    let f = fixture().await;
    let mut ids = Vec::new();
    for _ in 0..2 {
        let task = f
            .engine
            .create_task(
                f.admin.id,
                CreateTask {
                    test_id: f.test.id,
                    user_id: f.corrector.id,
                    student_id: None,
                    task_type: TaskType::EnterMarks,
                    due_date: None,
                },
            )
            .await
            .unwrap();
        ids.push(task.id);
    }

    f.engine
        .enter_marks(f.corrector.id, ids[0], 9, vec![Mark::new("A", 6.0)])
        .await
        .unwrap();
    let err = f
        .engine
        .enter_marks(f.corrector.id, ids[1], 9, vec![Mark::new("A", 2.0)])
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let second = f.engine.store().find_task(ids[1]).await.unwrap().unwrap();
    assert_eq!(second.task_status, TaskStatus::Pending);
    let result = f.engine.store().find_result(9, f.test.id).await.unwrap().unwrap();
    assert_eq!(result.marks, vec![Mark::new("A", 6.0)]);
}

#[tokio::test]
async fn deleting_twice_is_a_conflict_and_pulls_once() {
    let f = fixture().await;
    let keep = assignment_task(&f).await;
    let doomed = assignment_task(&f).await;

    let deleted = f.engine.delete_task(f.admin.id, doomed).await.unwrap();
    assert_eq!(deleted.task_status, TaskStatus::Deleted);
    assert_eq!(deleted.deleted_by, Some(f.admin.id));

    let err = f.engine.delete_task(f.admin.id, doomed).await.unwrap_err();
    assert!(err.is_conflict());

    let test = f.engine.store().find_test(f.test.id).await.unwrap().unwrap();
    assert_eq!(test.task_ids, vec![keep]);
    assert_eq!(f.engine.store().tasks_for_test(f.test.id).await.len(), 2);
}

#[tokio::test]
async fn update_task_reassigns_without_completing() {
    let f = fixture().await;
    let task_id = assignment_task(&f).await;

    let updated = f
        .engine
        .update_task(
            f.admin.id,
            task_id,
            TaskUpdate {
                user_id: Some(f.corrector.id),
                task_status: Some(TaskStatus::InProgress),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.user_id, f.corrector.id);
    assert_eq!(updated.task_status, TaskStatus::InProgress);
    assert!(updated.completed_at.is_none());

    let err = f
        .engine
        .update_task(
            f.admin.id,
            task_id,
            TaskUpdate {
                user_id: Some(999),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn concurrent_enter_marks_create_one_result() {
    let f = Arc::new(fixture().await);
    let task = f
        .engine
        .create_task(
            f.admin.id,
            CreateTask {
                test_id: f.test.id,
                user_id: f.corrector.id,
                student_id: None,
                task_type: TaskType::EnterMarks,
                due_date: None,
            },
        )
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let f = Arc::clone(&f);
        handles.push(tokio::spawn(async move {
            f.engine
                .enter_marks(f.corrector.id, task.id, 11, vec![Mark::new("A", i as f64)])
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => assert!(err.is_conflict(), "unexpected error {err:?}"),
        }
    }
    assert_eq!(successes, 1);

    let tasks = f.engine.store().tasks_for_test(f.test.id).await;
    let validations = tasks
        .iter()
        .filter(|t| t.task_type == TaskType::ValidateMarks)
        .count();
    assert_eq!(validations, 1);
}

#[tokio::test]
async fn notation_updates_that_orphan_criteria_are_rejected() {
    let f = fixture().await;

    let err = f
        .engine
        .update_notations(f.test.id, vec![Notation::new("B", 20.0)])
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation { .. }));
    let test = f.engine.store().find_test(f.test.id).await.unwrap().unwrap();
    assert!(test.notations.contains("A"));

    let updated = f
        .engine
        .update_notations(
            f.test.id,
            vec![Notation::new("A", 15.0), Notation::new("C", 5.0)],
        )
        .await
        .unwrap();
    assert_eq!(updated.notations.len(), 2);
    assert!(updated.passing_criteria.is_some());
}

#[tokio::test]
async fn criteria_referencing_unknown_notations_are_rejected() {
    let f = fixture().await;
    let err = f
        .engine
        .set_passing_criteria(
            f.test.id,
            Some(PassingCriteriaInput {
                pass_criteria: Some(branch(vec![mark_condition("Z", "GTE", 1.0)])),
                fail_criteria: None,
            }),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        WorkflowError::validation(
            "pass_criteria.test_criteria_groups[0].conditions[0].notation_text",
            "notation 'Z' does not match any notation of the test",
        )
    );

    let cleared = f.engine.set_passing_criteria(f.test.id, None).await.unwrap();
    assert!(cleared.passing_criteria.is_none());
}

#[tokio::test]
async fn corrector_assignment_queues_a_notification() {
    let f = fixture().await;
    let assign_id = assignment_task(&f).await;
    f.engine
        .assign_corrector(f.admin.id, assign_id, f.corrector.id, None)
        .await
        .unwrap();

    let outbox = f.engine.store().drain_notifications().await;
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].recipient, "corrector@example.com");
    assert!(outbox[0].body.ends_with("Exams Office"));
    assert!(outbox[0]
        .body
        .contains(&format!("https://grades.example.com/tests/{}/tasks", f.test.id)));
    assert!(f.engine.store().drain_notifications().await.is_empty());
}

#[tokio::test]
async fn missing_tasks_are_not_found() {
    let f = fixture().await;
    let err = f.engine.validate_marks(f.admin.id, 404).await.unwrap_err();
    assert_eq!(err, WorkflowError::NotFound("task 404".into()));
}
