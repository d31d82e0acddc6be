//! Uniform response shapes returned by engine operations
//!
//! Everything here serializes to JSON and YAML.

use serde::{Deserialize, Serialize};

use crate::artifacts::GenerationWarning;
use crate::coverage::{CoverageReport, CoverageSnapshot};
use crate::domain::{Artifact, PhaseRecord, Session, SessionStatus};
use crate::methodology::MethodologySelection;
use crate::pivot::PivotDecision;
use crate::workflow::AdvanceOutcome;

/// Session state as returned by start, status, rollback and close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub current_phase: String,
    pub coverage: CoverageSnapshot,
    pub phase_records: Vec<PhaseRecord>,
    pub methodology: Option<MethodologySelection>,
    pub artifacts: Vec<Artifact>,
    pub recommendations: Vec<String>,
}

impl SessionResponse {
    pub fn new(session: &Session, coverage: CoverageSnapshot, recommendations: Vec<String>) -> Self {
        Self {
            session_id: session.id.clone(),
            status: session.status,
            current_phase: session.current_phase.clone(),
            coverage,
            phase_records: session.records_in_order().into_iter().cloned().collect(),
            methodology: session.methodology.clone(),
            artifacts: session.artifacts.clone(),
            recommendations,
        }
    }
}

/// Result of advance-phase and skip-phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceResponse {
    pub session_id: String,
    pub success: bool,
    /// Phase the submission was scored against
    pub phase: String,
    pub current_phase: String,
    pub status: SessionStatus,
    pub coverage: CoverageReport,
    pub failure_reason: Option<String>,
    pub recommendations: Vec<String>,
}

impl AdvanceResponse {
    pub fn new(session_id: &str, outcome: AdvanceOutcome) -> Self {
        let failure_reason = outcome.failure_reason();
        Self {
            session_id: session_id.to_string(),
            success: outcome.advanced,
            phase: outcome.phase,
            current_phase: outcome.current_phase,
            status: outcome.status,
            coverage: outcome.report,
            failure_reason,
            recommendations: outcome.recommendations,
        }
    }
}

/// Result of validate-phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub session_id: String,
    pub report: CoverageReport,
    /// Whether the same submission would pass the advance gate
    pub would_advance: bool,
}

/// Result of evaluate-pivot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotResponse {
    pub session_id: String,
    pub decision: PivotDecision,
}

/// Result of generate-artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub session_id: String,
    pub artifacts: Vec<Artifact>,
    pub warnings: Vec<GenerationWarning>,
}
