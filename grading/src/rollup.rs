//! # Rollup Coordinator
//!
//! Composes per-test outcomes into subject- and block-level outcomes for a transcript.
//! Each test is classified by [`compute_average_and_outcome`], so comparison semantics
//! live in exactly one place. Levels above a test combine their children with
//! [`combine_outcomes`]:
//!
//! - [`Outcome::Fail`] if any required child fails;
//! - else [`Outcome::Indeterminate`] if any required child is indeterminate;
//! - else [`Outcome::Pass`].
//!
//! Children that are not required never affect their parent. A level with no required
//! children is indeterminate: there is nothing yet that it could have passed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::{Outcome, compute_average_and_outcome};
use crate::criteria::TestPassingCriteria;
use crate::report::{BlockReport, RollupReport, SubjectReport, TestReport};
use crate::types::Mark;

fn required_by_default() -> bool {
    true
}

/// One test of a subject, with the student's marks if they have been entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupTest {
    pub name: String,
    #[serde(default)]
    pub criteria: Option<TestPassingCriteria>,
    #[serde(default)]
    pub marks: Option<Vec<Mark>>,
    #[serde(default = "required_by_default")]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupSubject {
    pub name: String,
    pub tests: Vec<RollupTest>,
    #[serde(default = "required_by_default")]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupBlock {
    pub name: String,
    pub subjects: Vec<RollupSubject>,
}

/// Combines `(outcome, required)` pairs of child results into the parent's outcome.
pub fn combine_outcomes<I>(children: I) -> Outcome
where
    I: IntoIterator<Item = (Outcome, bool)>,
{
    let mut any_required = false;
    let mut any_indeterminate = false;

    for (outcome, required) in children {
        if !required {
            continue;
        }
        any_required = true;
        match outcome {
            Outcome::Fail => return Outcome::Fail,
            Outcome::Indeterminate => any_indeterminate = true,
            Outcome::Pass => {}
        }
    }

    if !any_required || any_indeterminate {
        Outcome::Indeterminate
    } else {
        Outcome::Pass
    }
}

/// Classifies one test; a test without entered marks is indeterminate.
pub fn assess_test(test: &RollupTest) -> TestReport {
    let (average_mark, outcome) = match &test.marks {
        Some(marks) => {
            let assessment = compute_average_and_outcome(marks, test.criteria.as_ref());
            (Some(assessment.average_mark), assessment.outcome)
        }
        None => (None, Outcome::Indeterminate),
    };

    TestReport {
        name: test.name.clone(),
        required: test.required,
        average_mark,
        outcome,
    }
}

pub fn rollup_subject(subject: &RollupSubject) -> SubjectReport {
    let tests: Vec<TestReport> = subject.tests.iter().map(assess_test).collect();
    let outcome = combine_outcomes(tests.iter().map(|t| (t.outcome, t.required)));
    debug!(subject = %subject.name, %outcome, tests = tests.len(), "subject rolled up");

    SubjectReport {
        name: subject.name.clone(),
        required: subject.required,
        outcome,
        tests,
    }
}

pub fn rollup_block(block: &RollupBlock) -> BlockReport {
    let subjects: Vec<SubjectReport> = block.subjects.iter().map(rollup_subject).collect();
    let outcome = combine_outcomes(subjects.iter().map(|s| (s.outcome, s.required)));
    debug!(block = %block.name, %outcome, "block rolled up");

    BlockReport {
        name: block.name.clone(),
        outcome,
        subjects,
    }
}

/// Rolls up every block of a transcript; every block counts towards the overall outcome.
pub fn rollup_transcript(blocks: &[RollupBlock], generated_at: DateTime<Utc>) -> RollupReport {
    let blocks: Vec<BlockReport> = blocks.iter().map(rollup_block).collect();
    let outcome = combine_outcomes(blocks.iter().map(|b| (b.outcome, true)));

    RollupReport {
        generated_at,
        outcome,
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::ComparisonOperator::{Gte, Lt};
    use crate::criteria::{Condition, CriteriaBranch, CriteriaGroup};
    use crate::aggregator::Outcome::*;

    fn criteria() -> TestPassingCriteria {
        TestPassingCriteria {
            pass_criteria: Some(CriteriaBranch::new(vec![CriteriaGroup::new(vec![
                Condition::average(Gte, 10.0),
            ])])),
            fail_criteria: Some(CriteriaBranch::new(vec![CriteriaGroup::new(vec![
                Condition::mark("A", Lt, 5.0),
            ])])),
        }
    }

    fn entry(name: &str, marks: Option<&[(&str, f64)]>, required: bool) -> RollupTest {
        RollupTest {
            name: name.into(),
            criteria: Some(criteria()),
            marks: marks.map(|pairs| pairs.iter().map(|(n, m)| Mark::new(*n, *m)).collect()),
            required,
        }
    }

    const PASSING: &[(&str, f64)] = &[("A", 12.0), ("B", 8.0)];
    const FAILING: &[(&str, f64)] = &[("A", 3.0), ("B", 15.0)];
    const UNDECIDED: &[(&str, f64)] = &[("A", 6.0), ("B", 8.0)];

    #[test]
    fn combine_follows_fail_then_indeterminate_then_pass() {
        assert_eq!(combine_outcomes([(Pass, true), (Pass, true)]), Pass);
        assert_eq!(combine_outcomes([(Pass, true), (Indeterminate, true)]), Indeterminate);
        assert_eq!(combine_outcomes([(Indeterminate, true), (Fail, true)]), Fail);
        assert_eq!(combine_outcomes([(Pass, true), (Fail, false)]), Pass);
        assert_eq!(combine_outcomes([(Fail, false)]), Indeterminate);
        assert_eq!(combine_outcomes(Vec::new()), Indeterminate);
    }

    #[test]
    fn subject_passes_only_when_all_required_tests_pass() {
        let subject = RollupSubject {
            name: "Mathematics".into(),
            tests: vec![entry("Algebra", Some(PASSING), true), entry("Geometry", Some(PASSING), true)],
            required: true,
        };
        let report = rollup_subject(&subject);
        assert_eq!(report.outcome, Pass);
        assert_eq!(report.tests[0].average_mark, Some(10.0));
    }

    #[test]
    fn failing_test_fails_the_subject_and_block() {
        let block = RollupBlock {
            name: "Semester 1".into(),
            subjects: vec![
                RollupSubject {
                    name: "Mathematics".into(),
                    tests: vec![
                        entry("Algebra", Some(PASSING), true),
                        entry("Geometry", Some(FAILING), true),
                    ],
                    required: true,
                },
                RollupSubject {
                    name: "History".into(),
                    tests: vec![entry("Essay", Some(UNDECIDED), true)],
                    required: true,
                },
            ],
        };
        let report = rollup_block(&block);
        assert_eq!(report.subjects[0].outcome, Fail);
        assert_eq!(report.subjects[1].outcome, Indeterminate);
        assert_eq!(report.outcome, Fail);
    }

    #[test]
    fn missing_marks_leave_the_subject_indeterminate() {
        let subject = RollupSubject {
            name: "Physics".into(),
            tests: vec![entry("Lab", Some(PASSING), true), entry("Exam", None, true)],
            required: true,
        };
        let report = rollup_subject(&subject);
        assert_eq!(report.tests[1].average_mark, None);
        assert_eq!(report.outcome, Indeterminate);
    }

    #[test]
    fn optional_children_are_ignored() {
        let block = RollupBlock {
            name: "Semester 2".into(),
            subjects: vec![
                RollupSubject {
                    name: "Chemistry".into(),
                    tests: vec![
                        entry("Exam", Some(PASSING), true),
                        entry("Quiz", Some(FAILING), false),
                    ],
                    required: true,
                },
                RollupSubject {
                    name: "Music".into(),
                    tests: vec![entry("Recital", Some(FAILING), true)],
                    required: false,
                },
            ],
        };
        let report = rollup_block(&block);
        assert_eq!(report.subjects[0].outcome, Pass);
        assert_eq!(report.subjects[1].outcome, Fail);
        assert_eq!(report.outcome, Pass);
    }

    #[test]
    fn transcript_combines_all_blocks() {
        let passing_block = RollupBlock {
            name: "Semester 1".into(),
            subjects: vec![RollupSubject {
                name: "Mathematics".into(),
                tests: vec![entry("Algebra", Some(PASSING), true)],
                required: true,
            }],
        };
        let pending_block = RollupBlock {
            name: "Semester 2".into(),
            subjects: vec![RollupSubject {
                name: "Mathematics II".into(),
                tests: vec![entry("Calculus", None, true)],
                required: true,
            }],
        };
        let now = Utc::now();

        let report = rollup_transcript(&[passing_block.clone()], now);
        assert_eq!(report.outcome, Pass);
        assert_eq!(report.generated_at, now);

        let report = rollup_transcript(&[passing_block, pending_block], now);
        assert_eq!(report.blocks[1].outcome, Indeterminate);
        assert_eq!(report.outcome, Indeterminate);
    }

    #[test]
    fn subjects_deserialize_with_required_default() {
        let subject: RollupSubject = serde_json::from_str(
            r#"{"name":"Art","tests":[{"name":"Portfolio","marks":[{"notation_text":"A","mark":12}]}]}"#,
        )
        .unwrap();
        assert!(subject.required);
        assert!(subject.tests[0].required);
        // No criteria: marks alone never pass a test.
        assert_eq!(rollup_subject(&subject).outcome, Indeterminate);
    }
}
