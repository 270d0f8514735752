use chrono::{DateTime, Utc};
use grading::{Mark, Outcome};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    /// Marks entered, awaiting validation.
    #[default]
    Pending,
    Validated,
}

/// A student's marks on one test. At most one exists per (student, test).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentTestResult {
    pub id: i64,
    pub student_id: i64,
    pub test_id: i64,
    pub marks: Vec<Mark>,
    pub average_mark: f64,
    pub outcome: Outcome,
    pub mark_entry_date: DateTime<Utc>,
    pub mark_validated_date: Option<DateTime<Utc>>,
    pub student_test_result_status: ResultStatus,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

impl StudentTestResult {
    pub(crate) fn mark_validated(&mut self, actor_id: i64, now: DateTime<Utc>) {
        self.student_test_result_status = ResultStatus::Validated;
        self.mark_validated_date = Some(now);
        self.updated_by = actor_id;
        self.updated_at = now;
    }
}

/// A result produced by entering marks, before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudentTestResult {
    pub student_id: i64,
    pub test_id: i64,
    pub marks: Vec<Mark>,
    pub average_mark: f64,
    pub outcome: Outcome,
    pub entered_by: i64,
    pub entered_at: DateTime<Utc>,
}

impl NewStudentTestResult {
    pub fn into_result(self, id: i64) -> StudentTestResult {
        StudentTestResult {
            id,
            student_id: self.student_id,
            test_id: self.test_id,
            marks: self.marks,
            average_mark: self.average_mark,
            outcome: self.outcome,
            mark_entry_date: self.entered_at,
            mark_validated_date: None,
            student_test_result_status: ResultStatus::Pending,
            created_by: self.entered_by,
            created_at: self.entered_at,
            updated_by: self.entered_by,
            updated_at: self.entered_at,
        }
    }
}
