//! # Types Module
//!
//! Leaf data shared by the whole grading pipeline: the notations a test defines,
//! the marks a corrector enters against them, and the [`NotationSet`] catalog that
//! criteria and marks are checked against.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::GradingError;

/// A named, bounded mark component of a test (e.g. "Essay", out of 20).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Notation {
    /// Join key used by criteria and marks; unique within a test.
    #[validate(length(min = 1, message = "notation_text must not be empty"))]
    pub notation_text: String,
    /// Highest mark that can be entered for this notation.
    #[validate(range(min = 0.0, message = "max_points must be non-negative"))]
    pub max_points: f64,
}

impl Notation {
    pub fn new(notation_text: impl Into<String>, max_points: f64) -> Self {
        Self {
            notation_text: notation_text.into(),
            max_points,
        }
    }
}

/// A mark entered by a corrector for one notation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub notation_text: String,
    pub mark: f64,
}

impl Mark {
    pub fn new(notation_text: impl Into<String>, mark: f64) -> Self {
        Self {
            notation_text: notation_text.into(),
            mark,
        }
    }
}

/// The validated, ordered catalog of a test's notations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Notation>", into = "Vec<Notation>")]
pub struct NotationSet {
    notations: Vec<Notation>,
}

impl NotationSet {
    /// Builds a catalog, rejecting blank or duplicate names and negative bounds.
    pub fn new(notations: Vec<Notation>) -> Result<Self, GradingError> {
        let mut seen = HashSet::with_capacity(notations.len());

        for (index, notation) in notations.iter().enumerate() {
            if let Err(errors) = notation.validate() {
                let field = common::first_invalid_field(&errors)
                    .unwrap_or_else(|| "notation_text".to_string());
                return Err(GradingError::validation(
                    format!("notations[{index}].{field}"),
                    common::format_validation_errors(&errors),
                ));
            }
            if notation.notation_text.trim().is_empty() {
                return Err(GradingError::validation(
                    format!("notations[{index}].notation_text"),
                    "notation_text must not be blank",
                ));
            }
            if !notation.max_points.is_finite() {
                return Err(GradingError::validation(
                    format!("notations[{index}].max_points"),
                    "max_points must be a finite number",
                ));
            }
            if !seen.insert(notation.notation_text.as_str()) {
                return Err(GradingError::validation(
                    format!("notations[{index}].notation_text"),
                    format!(
                        "notation '{}' is defined more than once",
                        notation.notation_text
                    ),
                ));
            }
        }

        Ok(Self { notations })
    }

    pub fn get(&self, notation_text: &str) -> Option<&Notation> {
        self.notations
            .iter()
            .find(|n| n.notation_text == notation_text)
    }

    pub fn contains(&self, notation_text: &str) -> bool {
        self.get(notation_text).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notation> {
        self.notations.iter()
    }

    pub fn len(&self) -> usize {
        self.notations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notations.is_empty()
    }

    /// Sum of every notation's `max_points`.
    pub fn total_points(&self) -> f64 {
        self.notations.iter().map(|n| n.max_points).sum()
    }
}

impl TryFrom<Vec<Notation>> for NotationSet {
    type Error = GradingError;

    fn try_from(notations: Vec<Notation>) -> Result<Self, Self::Error> {
        NotationSet::new(notations)
    }
}

impl From<NotationSet> for Vec<Notation> {
    fn from(set: NotationSet) -> Self {
        set.notations
    }
}
