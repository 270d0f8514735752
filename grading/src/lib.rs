//! # Grading Library
//!
//! Pure, synchronous evaluation logic for test results:
//!
//! - **Notations** ([`types`]): the named, bounded mark components a test defines.
//! - **Criteria** ([`criteria`]): pass/fail rules as nested AND/OR trees, with a
//!   structural validator and a total evaluator.
//! - **Aggregation** ([`aggregator`]): average mark and PASS/FAIL/INDETERMINATE
//!   classification with fail precedence.
//! - **Rollup** ([`rollup`], [`report`]): test outcomes composed into subject, block and
//!   transcript outcomes.
//!
//! Nothing here performs I/O or keeps state between calls; every function can be called
//! concurrently from any number of requests.

pub mod aggregator;
pub mod criteria;
pub mod error;
pub mod report;
pub mod rollup;
pub mod traits;
pub mod types;

pub use aggregator::{Assessment, Outcome, compute_average, compute_average_and_outcome};
pub use criteria::evaluator::evaluate_branch;
pub use criteria::validator::{revalidate_passing_criteria, validate_passing_criteria};
pub use error::GradingError;
pub use types::{Mark, Notation, NotationSet};
