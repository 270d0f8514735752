use grading::GradingError;

/// Failure of a workflow operation. No variant leaves a partial mutation behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    /// Malformed or out-of-domain input; never worth retrying unchanged.
    #[error("validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    /// The task (or result) is not in the state the operation requires.
    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The storage collaborator failed.
    #[error("store error: {0}")]
    Store(String),
}

impl WorkflowError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, WorkflowError::StateConflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkflowError::NotFound(_))
    }
}

impl From<GradingError> for WorkflowError {
    fn from(err: GradingError) -> Self {
        match err {
            GradingError::Validation { field, message } => {
                WorkflowError::Validation { field, message }
            }
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
