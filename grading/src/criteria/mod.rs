//! # Passing Criteria
//!
//! A test's pass/fail rules form a small immutable tree:
//!
//! - a [`Condition`] compares one observed value (a notation's mark, or the average)
//!   against a threshold;
//! - a [`CriteriaGroup`] holds when **all** of its conditions hold;
//! - a [`CriteriaBranch`] holds when **any** of its groups holds;
//! - [`TestPassingCriteria`] carries an optional pass branch and an optional fail branch.
//!
//! The API layer hands criteria over as `*Input` records whose enum fields are still raw
//! strings. [`validator::validate_passing_criteria`] turns an input into the typed tree,
//! and [`evaluator::evaluate_branch`] decides whether a branch holds for a set of marks.

pub mod evaluator;
pub mod validator;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What a condition observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CriteriaType {
    /// The mark entered for one named notation.
    Mark,
    /// The test's average mark.
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    Gte,
    Lte,
    Gt,
    Lt,
    /// Exact numeric equality.
    E,
}

impl ComparisonOperator {
    /// Applies the operator as `observed <op> threshold`.
    pub fn compare(self, observed: f64, threshold: f64) -> bool {
        match self {
            ComparisonOperator::Gte => observed >= threshold,
            ComparisonOperator::Lte => observed <= threshold,
            ComparisonOperator::Gt => observed > threshold,
            ComparisonOperator::Lt => observed < threshold,
            ComparisonOperator::E => observed == threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub criteria_type: CriteriaType,
    pub comparison_operator: ComparisonOperator,
    pub mark: f64,
    /// Required for [`CriteriaType::Mark`], ignored for [`CriteriaType::Average`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notation_text: Option<String>,
}

impl Condition {
    pub fn mark(notation_text: impl Into<String>, op: ComparisonOperator, mark: f64) -> Self {
        Self {
            criteria_type: CriteriaType::Mark,
            comparison_operator: op,
            mark,
            notation_text: Some(notation_text.into()),
        }
    }

    pub fn average(op: ComparisonOperator, mark: f64) -> Self {
        Self {
            criteria_type: CriteriaType::Average,
            comparison_operator: op,
            mark,
            notation_text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaGroup {
    pub conditions: Vec<Condition>,
}

impl CriteriaGroup {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaBranch {
    pub test_criteria_groups: Vec<CriteriaGroup>,
}

impl CriteriaBranch {
    pub fn new(test_criteria_groups: Vec<CriteriaGroup>) -> Self {
        Self {
            test_criteria_groups,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestPassingCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_criteria: Option<CriteriaBranch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_criteria: Option<CriteriaBranch>,
}

// --- Unvalidated input, as received from the API layer ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionInput {
    pub criteria_type: String,
    pub comparison_operator: String,
    pub mark: f64,
    #[serde(default)]
    pub notation_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteriaGroupInput {
    #[serde(default)]
    pub conditions: Vec<ConditionInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteriaBranchInput {
    #[serde(default)]
    pub test_criteria_groups: Vec<CriteriaGroupInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassingCriteriaInput {
    #[serde(default)]
    pub pass_criteria: Option<CriteriaBranchInput>,
    #[serde(default)]
    pub fail_criteria: Option<CriteriaBranchInput>,
}

impl From<&Condition> for ConditionInput {
    fn from(condition: &Condition) -> Self {
        Self {
            criteria_type: condition.criteria_type.to_string(),
            comparison_operator: condition.comparison_operator.to_string(),
            mark: condition.mark,
            notation_text: condition.notation_text.clone(),
        }
    }
}

impl From<&CriteriaBranch> for CriteriaBranchInput {
    fn from(branch: &CriteriaBranch) -> Self {
        Self {
            test_criteria_groups: branch
                .test_criteria_groups
                .iter()
                .map(|group| CriteriaGroupInput {
                    conditions: group.conditions.iter().map(ConditionInput::from).collect(),
                })
                .collect(),
        }
    }
}

impl From<&TestPassingCriteria> for PassingCriteriaInput {
    fn from(criteria: &TestPassingCriteria) -> Self {
        Self {
            pass_criteria: criteria.pass_criteria.as_ref().map(CriteriaBranchInput::from),
            fail_criteria: criteria.fail_criteria.as_ref().map(CriteriaBranchInput::from),
        }
    }
}
