//! Methodology selection
//!
//! Maps project signals to a delivery methodology through an ordered rule
//! table. Used at most once per session, at start.

mod selector;
mod signals;

pub use selector::{METHODOLOGY_RULES, Methodology, MethodologyRule, MethodologySelection, select, select_with};
pub use signals::{ProblemFraming, ProjectSignals, ProjectType, RiskTolerance, TeamSize, Timeline};
