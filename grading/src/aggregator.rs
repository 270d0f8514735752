//! # Aggregator Module
//!
//! Turns a corrector's marks into the two numbers downstream code cares about: the
//! test average and the pass/fail outcome.
//!
//! The outcome is decided by the test's passing criteria with **fail precedence**:
//!
//! 1. if `fail_criteria` is present and satisfied the outcome is [`Outcome::Fail`];
//! 2. else if `pass_criteria` is present and satisfied it is [`Outcome::Pass`];
//! 3. otherwise it is [`Outcome::Indeterminate`].
//!
//! An explicit failure condition therefore always overrides a satisfied pass condition.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::criteria::TestPassingCriteria;
use crate::criteria::evaluator::evaluate_branch;
use crate::error::GradingError;
use crate::types::{Mark, NotationSet};

/// Classification of a test result, or of a subject/block in a rollup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Pass,
    Fail,
    /// Neither branch conclusively holds; treated as "not yet passing".
    Indeterminate,
}

/// Average and outcome computed for one set of marks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub average_mark: f64,
    pub outcome: Outcome,
}

/// Round a float to two decimal places.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Arithmetic mean of the entered marks, rounded to two decimals; `0` when there are none.
///
/// ```
/// use grading::aggregator::compute_average;
/// use grading::types::Mark;
///
/// let marks = vec![Mark::new("A", 12.0), Mark::new("B", 8.0)];
/// assert_eq!(compute_average(&marks), 10.0);
/// assert_eq!(compute_average(&[]), 0.0);
/// ```
pub fn compute_average(marks: &[Mark]) -> f64 {
    if marks.is_empty() {
        return 0.0;
    }
    let sum: f64 = marks.iter().map(|m| m.mark).sum();
    round2(sum / marks.len() as f64)
}

/// Classifies `marks` against `criteria` using fail precedence.
pub fn classify(criteria: Option<&TestPassingCriteria>, marks: &[Mark], average: f64) -> Outcome {
    let Some(criteria) = criteria else {
        return Outcome::Indeterminate;
    };

    if evaluate_branch(criteria.fail_criteria.as_ref(), marks, average) {
        Outcome::Fail
    } else if evaluate_branch(criteria.pass_criteria.as_ref(), marks, average) {
        Outcome::Pass
    } else {
        Outcome::Indeterminate
    }
}

/// Computes the average of `marks` and classifies them against `criteria`.
pub fn compute_average_and_outcome(
    marks: &[Mark],
    criteria: Option<&TestPassingCriteria>,
) -> Assessment {
    let average_mark = compute_average(marks);
    let outcome = classify(criteria, marks, average_mark);
    debug!(average_mark, %outcome, marks = marks.len(), "marks assessed");
    Assessment {
        average_mark,
        outcome,
    }
}

/// Checks entered marks against the test's notations before they are recorded.
///
/// Every mark must name an existing notation, no notation may be marked twice, and each
/// mark must be a finite number within `0..=max_points`. Notations left without a mark
/// are allowed.
pub fn validate_marks(marks: &[Mark], notations: &NotationSet) -> Result<(), GradingError> {
    let mut seen = HashSet::with_capacity(marks.len());

    for (index, mark) in marks.iter().enumerate() {
        let Some(notation) = notations.get(&mark.notation_text) else {
            return Err(GradingError::validation(
                format!("marks[{index}].notation_text"),
                format!(
                    "notation '{}' does not match any notation of the test",
                    mark.notation_text
                ),
            ));
        };
        if !seen.insert(mark.notation_text.as_str()) {
            return Err(GradingError::validation(
                format!("marks[{index}].notation_text"),
                format!("notation '{}' is marked more than once", mark.notation_text),
            ));
        }
        if !mark.mark.is_finite() || mark.mark < 0.0 || mark.mark > notation.max_points {
            return Err(GradingError::validation(
                format!("marks[{index}].mark"),
                format!(
                    "mark for '{}' must be between 0 and {}",
                    notation.notation_text, notation.max_points
                ),
            ));
        }
    }

    Ok(())
}
