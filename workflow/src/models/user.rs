use serde::{Deserialize, Serialize};

/// A platform user as far as the workflow needs one: to assign tasks and notify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}
