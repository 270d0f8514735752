//! # Criteria Evaluator
//!
//! Decides whether a [`CriteriaBranch`] holds for a set of entered marks and the
//! test's average:
//!
//! - a branch holds if **any** group holds (OR);
//! - a group holds if **all** of its conditions hold (AND);
//! - a condition holds if `operator(observed, condition.mark)` is true, where the
//!   observed value is the notation's entered mark (`MARK`) or the average (`AVERAGE`).
//!
//! The evaluator never fails. A `MARK` condition whose notation has no entered mark,
//! or that names no notation at all, is not satisfied; an absent branch is not satisfied.

use std::collections::HashMap;

use tracing::debug;

use crate::criteria::{Condition, CriteriaBranch, CriteriaGroup, CriteriaType};
use crate::traits::criterion::Criterion;
use crate::types::Mark;

/// Entered marks indexed by notation, together with the test's average.
#[derive(Debug, Clone)]
pub struct Observations<'a> {
    marks: HashMap<&'a str, f64>,
    average: f64,
}

impl<'a> Observations<'a> {
    /// Indexes `marks` by notation. If a notation appears twice, the first mark counts.
    pub fn new(marks: &'a [Mark], average: f64) -> Self {
        let mut indexed = HashMap::with_capacity(marks.len());
        for mark in marks {
            indexed.entry(mark.notation_text.as_str()).or_insert(mark.mark);
        }
        Self {
            marks: indexed,
            average,
        }
    }

    pub fn mark_for(&self, notation_text: &str) -> Option<f64> {
        self.marks.get(notation_text).copied()
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    fn observed(&self, condition: &Condition) -> Option<f64> {
        match condition.criteria_type {
            CriteriaType::Average => Some(self.average),
            CriteriaType::Mark => condition
                .notation_text
                .as_deref()
                .and_then(|notation| self.mark_for(notation)),
        }
    }
}

impl Criterion for Condition {
    fn is_satisfied(&self, observations: &Observations<'_>) -> bool {
        match observations.observed(self) {
            Some(observed) => self.comparison_operator.compare(observed, self.mark),
            None => {
                debug!(
                    notation = self.notation_text.as_deref().unwrap_or("<none>"),
                    "no mark entered for condition; treating as not satisfied"
                );
                false
            }
        }
    }
}

impl Criterion for CriteriaGroup {
    fn is_satisfied(&self, observations: &Observations<'_>) -> bool {
        // An empty group never holds; validated criteria never contain one.
        !self.conditions.is_empty()
            && self
                .conditions
                .iter()
                .all(|condition| condition.is_satisfied(observations))
    }
}

impl Criterion for CriteriaBranch {
    fn is_satisfied(&self, observations: &Observations<'_>) -> bool {
        self.test_criteria_groups
            .iter()
            .any(|group| group.is_satisfied(observations))
    }
}

/// Returns true when `branch` is present and at least one of its groups holds.
pub fn evaluate_branch(branch: Option<&CriteriaBranch>, marks: &[Mark], average: f64) -> bool {
    match branch {
        Some(branch) => branch.is_satisfied(&Observations::new(marks, average)),
        None => false,
    }
}
