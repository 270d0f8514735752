//! # Criteria Validator
//!
//! Structural validation of a test's passing criteria against the test's notations,
//! run when a test is defined and again whenever its notations change.
//!
//! Rules are applied in a fixed order and the first failure is reported:
//!
//! 1. at least one of `pass_criteria` / `fail_criteria` is present;
//! 2. every present branch has at least one group;
//! 3. every group has at least one condition;
//! 4. per condition: `criteria_type` is `MARK` or `AVERAGE`, `comparison_operator` is one
//!    of `GTE`, `LTE`, `GT`, `LT`, `E`, and `mark` is a finite, non-negative number;
//! 5. a `MARK` condition names a notation (`notation_text` present and not blank) that
//!    exists in the notation set.
//!
//! Rules 1 to 3 are checked over the whole tree before any condition is inspected.
//! Branches are visited pass first, then fail.

use std::str::FromStr;

use tracing::debug;

use crate::criteria::{
    ComparisonOperator, Condition, ConditionInput, CriteriaBranch, CriteriaBranchInput,
    CriteriaGroup, CriteriaType, PassingCriteriaInput, TestPassingCriteria,
};
use crate::error::GradingError;
use crate::types::NotationSet;

const PASS: &str = "pass_criteria";
const FAIL: &str = "fail_criteria";

fn branches(input: &PassingCriteriaInput) -> [(&'static str, Option<&CriteriaBranchInput>); 2] {
    [
        (PASS, input.pass_criteria.as_ref()),
        (FAIL, input.fail_criteria.as_ref()),
    ]
}

fn check_structure(input: &PassingCriteriaInput) -> Result<(), GradingError> {
    if input.pass_criteria.is_none() && input.fail_criteria.is_none() {
        return Err(GradingError::validation(
            "test_passing_criteria",
            "at least one of pass_criteria or fail_criteria is required",
        ));
    }

    for (name, branch) in branches(input) {
        let Some(branch) = branch else { continue };
        if branch.test_criteria_groups.is_empty() {
            return Err(GradingError::validation(
                format!("{name}.test_criteria_groups"),
                "must contain at least one criteria group",
            ));
        }
    }

    for (name, branch) in branches(input) {
        let Some(branch) = branch else { continue };
        for (g, group) in branch.test_criteria_groups.iter().enumerate() {
            if group.conditions.is_empty() {
                return Err(GradingError::validation(
                    format!("{name}.test_criteria_groups[{g}].conditions"),
                    "must contain at least one condition",
                ));
            }
        }
    }

    Ok(())
}

fn check_condition(
    path: &str,
    input: &ConditionInput,
    notations: &NotationSet,
) -> Result<Condition, GradingError> {
    let criteria_type = CriteriaType::from_str(&input.criteria_type).map_err(|_| {
        GradingError::validation(
            format!("{path}.criteria_type"),
            format!(
                "'{}' is not a valid criteria type (expected MARK or AVERAGE)",
                input.criteria_type
            ),
        )
    })?;

    let comparison_operator =
        ComparisonOperator::from_str(&input.comparison_operator).map_err(|_| {
            GradingError::validation(
                format!("{path}.comparison_operator"),
                format!(
                    "'{}' is not a valid comparison operator (expected GTE, LTE, GT, LT or E)",
                    input.comparison_operator
                ),
            )
        })?;

    if !input.mark.is_finite() || input.mark < 0.0 {
        return Err(GradingError::validation(
            format!("{path}.mark"),
            "mark must be a non-negative number",
        ));
    }

    let notation_text = match criteria_type {
        CriteriaType::Average => None,
        CriteriaType::Mark => {
            let notation = match input.notation_text.as_deref() {
                Some(text) if !text.trim().is_empty() => text,
                _ => {
                    return Err(GradingError::validation(
                        format!("{path}.notation_text"),
                        "notation_text is required for MARK criteria",
                    ));
                }
            };
            if !notations.contains(notation) {
                return Err(GradingError::validation(
                    format!("{path}.notation_text"),
                    format!("notation '{notation}' does not match any notation of the test"),
                ));
            }
            Some(notation.to_string())
        }
    };

    Ok(Condition {
        criteria_type,
        comparison_operator,
        mark: input.mark,
        notation_text,
    })
}

fn check_branch(
    name: &str,
    branch: &CriteriaBranchInput,
    notations: &NotationSet,
) -> Result<CriteriaBranch, GradingError> {
    let mut groups = Vec::with_capacity(branch.test_criteria_groups.len());
    for (g, group) in branch.test_criteria_groups.iter().enumerate() {
        let mut conditions = Vec::with_capacity(group.conditions.len());
        for (c, condition) in group.conditions.iter().enumerate() {
            let path = format!("{name}.test_criteria_groups[{g}].conditions[{c}]");
            conditions.push(check_condition(&path, condition, notations)?);
        }
        groups.push(CriteriaGroup::new(conditions));
    }
    Ok(CriteriaBranch::new(groups))
}

/// Validates submitted criteria against `notations` and returns the typed tree.
pub fn validate_passing_criteria(
    input: &PassingCriteriaInput,
    notations: &NotationSet,
) -> Result<TestPassingCriteria, GradingError> {
    check_structure(input)?;

    let pass_criteria = input
        .pass_criteria
        .as_ref()
        .map(|branch| check_branch(PASS, branch, notations))
        .transpose()?;
    let fail_criteria = input
        .fail_criteria
        .as_ref()
        .map(|branch| check_branch(FAIL, branch, notations))
        .transpose()?;

    debug!(
        notations = notations.len(),
        has_pass = pass_criteria.is_some(),
        has_fail = fail_criteria.is_some(),
        "passing criteria accepted"
    );

    Ok(TestPassingCriteria {
        pass_criteria,
        fail_criteria,
    })
}

/// Re-checks already-typed criteria, e.g. after a test's notations were replaced.
pub fn revalidate_passing_criteria(
    criteria: &TestPassingCriteria,
    notations: &NotationSet,
) -> Result<(), GradingError> {
    validate_passing_criteria(&PassingCriteriaInput::from(criteria), notations).map(|_| ())
}
