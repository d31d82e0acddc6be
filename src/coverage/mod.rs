//! Coverage scoring
//!
//! `calculator` scores one phase submission; `rules` holds the tagged keyword
//! table shared with the pivot engine.

mod calculator;
pub mod rules;
mod snapshot;

pub use calculator::{
    CONSTRAINTS_WEIGHT, CoverageCalculator, CoverageReport, DOCUMENTATION_WEIGHT, PhaseSubmission,
    REQUIREMENTS_WEIGHT, TESTING_WEIGHT, TestEvidence, clamp, weighted_overall,
};
pub use snapshot::CoverageSnapshot;
