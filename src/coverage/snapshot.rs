//! Session-level coverage view

use serde::{Deserialize, Serialize};

use super::calculator::{CoverageCalculator, CoverageReport, clamp};
use crate::domain::{PhaseRecord, PhaseSequence};

/// Coverage across a whole session, recomputed whenever it is returned
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageSnapshot {
    /// Percentage of phases validated or skipped
    pub phases: f64,
    /// Percentage of stated assumptions backed by evidence
    pub assumptions: f64,
    /// Report from the most recent advance attempt
    ///
    /// After a successful advance this is the report of the phase just left,
    /// named by its `phase` field. Validation never sets it; rollback and
    /// skip clear it.
    pub latest: Option<CoverageReport>,
}

impl CoverageSnapshot {
    pub fn compute<'a>(
        calculator: &CoverageCalculator,
        sequence: &PhaseSequence,
        records: impl IntoIterator<Item = &'a PhaseRecord> + Clone,
        latest: Option<&CoverageReport>,
    ) -> Self {
        let done = records
            .clone()
            .into_iter()
            .filter(|r| r.status.is_done() && sequence.contains(&r.phase))
            .count();
        let phases = if sequence.is_empty() {
            0.0
        } else {
            clamp(done as f64 / sequence.len() as f64 * 100.0)
        };
        let assumptions = calculator.assumptions_score(records.into_iter().map(|r| r.content.as_str()));
        Self {
            phases,
            assumptions,
            latest: latest.cloned(),
        }
    }

    /// Overall score of the latest report, zero when nothing was submitted
    pub fn overall(&self) -> f64 {
        self.latest.as_ref().map(|r| r.overall).unwrap_or(0.0)
    }
}
