use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use grading::criteria::{
    ConditionInput, CriteriaBranchInput, CriteriaGroupInput, PassingCriteriaInput,
    TestPassingCriteria,
};
use grading::{Mark, Notation, NotationSet};
use tokio::sync::Notify;
use workflow::models::{
    CreateTask, NewTask, StudentTestResult, Task, TaskStatus, TaskType, Test, TestDraft, User,
};
use workflow::store::CommitReceipt;
use workflow::{
    InMemoryStore, NotificationSettings, TaskStore, TransitionOutcome, WorkflowEngine,
    WorkflowResult,
};

/// Delegates to an [`InMemoryStore`], holding the next `find_test` caller once armed
/// until the test releases it.
#[derive(Default)]
struct GatedStore {
    inner: InMemoryStore,
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

impl GatedStore {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskStore for GatedStore {
    async fn find_task(&self, task_id: i64) -> WorkflowResult<Option<Task>> {
        self.inner.find_task(task_id).await
    }

    async fn find_test(&self, test_id: i64) -> WorkflowResult<Option<Test>> {
        let test = self.inner.find_test(test_id).await;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
        test
    }

    async fn find_user(&self, user_id: i64) -> WorkflowResult<Option<User>> {
        self.inner.find_user(user_id).await
    }

    async fn find_result(
        &self,
        student_id: i64,
        test_id: i64,
    ) -> WorkflowResult<Option<StudentTestResult>> {
        self.inner.find_result(student_id, test_id).await
    }

    async fn insert_test(&self, draft: TestDraft) -> WorkflowResult<Test> {
        self.inner.insert_test(draft).await
    }

    async fn replace_notations(
        &self,
        test_id: i64,
        expected_version: i64,
        notations: NotationSet,
    ) -> WorkflowResult<Test> {
        self.inner
            .replace_notations(test_id, expected_version, notations)
            .await
    }

    async fn replace_criteria(
        &self,
        test_id: i64,
        expected_version: i64,
        passing_criteria: Option<TestPassingCriteria>,
    ) -> WorkflowResult<Test> {
        self.inner
            .replace_criteria(test_id, expected_version, passing_criteria)
            .await
    }

    async fn insert_task(&self, task: NewTask) -> WorkflowResult<Task> {
        self.inner.insert_task(task).await
    }

    async fn commit(&self, outcome: TransitionOutcome) -> WorkflowResult<CommitReceipt> {
        self.inner.commit(outcome).await
    }
}

async fn engine_with_test() -> (Arc<WorkflowEngine<GatedStore>>, User, Test) {
    let store = GatedStore::default();
    let user = store.inner.add_user("Corrector", "corrector@example.com").await;
    let engine = WorkflowEngine::new(store, NotificationSettings::default());
    let test = engine
        .define_test(
            "Physiology",
            vec![Notation::new("A", 10.0), Notation::new("B", 20.0)],
            None,
        )
        .await
        .unwrap();
    (Arc::new(engine), user, test)
}

#[tokio::test]
async fn notation_change_during_enter_marks_rejects_the_marks() {
    let (engine, user, test) = engine_with_test().await;
    let task = engine
        .create_task(
            user.id,
            CreateTask {
                test_id: test.id,
                user_id: user.id,
                student_id: None,
                task_type: TaskType::EnterMarks,
                due_date: None,
            },
        )
        .await
        .unwrap();

    let (user_id, task_id) = (user.id, task.id);

    engine.store().arm();
    let entering = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .enter_marks(user_id, task_id, 3, vec![Mark::new("B", 12.0)])
                .await
        })
    };
    engine.store().reached.notified().await;
    engine
        .update_notations(test.id, vec![Notation::new("A", 10.0)])
        .await
        .unwrap();
    engine.store().release.notify_one();

    let err = entering.await.unwrap().unwrap_err();
    assert!(err.is_conflict(), "unexpected error {err:?}");
    assert!(engine.store().find_result(3, test.id).await.unwrap().is_none());
    let stored = engine.store().find_task(task.id).await.unwrap().unwrap();
    assert_eq!(stored.task_status, TaskStatus::Pending);
}

#[tokio::test]
async fn notation_update_during_criteria_change_is_not_undone() {
    let (engine, _user, test) = engine_with_test().await;
    let test_id = test.id;

    engine.store().arm();
    let setting = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .set_passing_criteria(
                    test_id,
                    Some(PassingCriteriaInput {
                        pass_criteria: Some(CriteriaBranchInput {
                            test_criteria_groups: vec![CriteriaGroupInput {
                                conditions: vec![ConditionInput {
                                    criteria_type: "AVERAGE".into(),
                                    comparison_operator: "GTE".into(),
                                    mark: 5.0,
                                    notation_text: None,
                                }],
                            }],
                        }),
                        fail_criteria: None,
                    }),
                )
                .await
        })
    };
    engine.store().reached.notified().await;
    engine
        .update_notations(
            test.id,
            vec![
                Notation::new("A", 10.0),
                Notation::new("B", 20.0),
                Notation::new("C", 5.0),
            ],
        )
        .await
        .unwrap();
    engine.store().release.notify_one();

    let err = setting.await.unwrap().unwrap_err();
    assert!(err.is_conflict(), "unexpected error {err:?}");
    let stored = engine.store().find_test(test.id).await.unwrap().unwrap();
    let names: Vec<&str> = stored
        .notations
        .iter()
        .map(|n| n.notation_text.as_str())
        .collect();
    assert_eq!(names, ["A", "B", "C"]);
    assert!(stored.passing_criteria.is_none());
    assert_eq!(stored.version, test.version + 1);
}
