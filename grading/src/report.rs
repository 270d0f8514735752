//! # Rollup Report Module
//!
//! Serializable results of a transcript rollup, and the response envelope the API layer
//! returns them in.
//!
//! ## JSON Output Example
//!
//! ```json
//! {
//!   "success": true,
//!   "message": "Rollup complete.",
//!   "data": {
//!     "generated_at": "2026-01-01T00:00:00Z",
//!     "outcome": "FAIL",
//!     "blocks": [
//!       {
//!         "name": "Semester 1",
//!         "outcome": "FAIL",
//!         "subjects": [
//!           {
//!             "name": "Mathematics",
//!             "required": true,
//!             "outcome": "FAIL",
//!             "tests": [
//!               { "name": "Algebra", "required": true, "average_mark": 9.0, "outcome": "FAIL" }
//!             ]
//!           }
//!         ]
//!       }
//!     ]
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::Outcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub name: String,
    pub required: bool,
    /// `None` while no marks have been entered.
    pub average_mark: Option<f64>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectReport {
    pub name: String,
    pub required: bool,
    pub outcome: Outcome,
    pub tests: Vec<TestReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockReport {
    pub name: String,
    pub outcome: Outcome,
    pub subjects: Vec<SubjectReport>,
}

/// Outcome of every block of a transcript, plus the overall outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupReport {
    pub generated_at: DateTime<Utc>,
    pub outcome: Outcome,
    pub blocks: Vec<BlockReport>,
}

/// The API response envelope for rollup results.
#[derive(Debug, Serialize)]
pub struct RollupReportResponse {
    success: bool,
    message: String,
    data: RollupReport,
}

impl From<RollupReport> for RollupReportResponse {
    fn from(report: RollupReport) -> Self {
        RollupReportResponse {
            success: true,
            message: "Rollup complete.".to_string(),
            data: report,
        }
    }
}
