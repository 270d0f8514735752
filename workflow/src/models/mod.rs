pub mod student_test_result;
pub mod task;
pub mod user;

pub use student_test_result::{NewStudentTestResult, ResultStatus, StudentTestResult};
pub use task::{CreateTask, NewTask, Task, TaskStatus, TaskType, TaskUpdate};
pub use test::{Test, TestDraft};
pub use user::User;
