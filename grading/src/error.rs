//! Grading Error Types
//!
//! This module defines [`GradingError`], the single failure type of the pure grading
//! pipeline. Validation of notations, passing criteria and entered marks all report
//! through it, always naming the offending field with a fully qualified path such as
//! `pass_criteria.test_criteria_groups[0].conditions[2].notation_text`.
//!
//! # Example
//!
//! ```rust
//! use grading::error::GradingError;
//!
//! let err = GradingError::validation("notations[0].max_points", "must be non-negative");
//! assert_eq!(err.field(), "notations[0].max_points");
//! assert_eq!(err.to_string(), "notations[0].max_points: must be non-negative");
//! ```

/// Represents every way grading input can be rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GradingError {
    /// Malformed or out-of-domain input, reported with its field path.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
}

impl GradingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        GradingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Path of the field that failed validation.
    pub fn field(&self) -> &str {
        match self {
            GradingError::Validation { field, .. } => field,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GradingError::Validation { message, .. } => message,
        }
    }
}
