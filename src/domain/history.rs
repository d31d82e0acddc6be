//! Session history log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum HistoryEvent {
    SessionStarted,
    MethodologySelected { methodology: String },
    PhaseValidated { phase: String, coverage: f64 },
    AdvanceBlocked { phase: String, coverage: f64, reasons: Vec<String> },
    PhaseAdvanced { from: String, to: String },
    PhaseSkipped { phase: String },
    RolledBack { from: String, to: String },
    PivotEvaluated { recommend_pivot: bool, indicators: usize },
    ArtifactsGenerated { generated: Vec<String>, warnings: usize },
    SessionCompleted,
    SessionFailed,
}

impl HistoryEvent {
    /// Short stable name, used for filtering and display
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionStarted => "session-started",
            Self::MethodologySelected { .. } => "methodology-selected",
            Self::PhaseValidated { .. } => "phase-validated",
            Self::AdvanceBlocked { .. } => "advance-blocked",
            Self::PhaseAdvanced { .. } => "phase-advanced",
            Self::PhaseSkipped { .. } => "phase-skipped",
            Self::RolledBack { .. } => "rolled-back",
            Self::PivotEvaluated { .. } => "pivot-evaluated",
            Self::ArtifactsGenerated { .. } => "artifacts-generated",
            Self::SessionCompleted => "session-completed",
            Self::SessionFailed => "session-failed",
        }
    }
}

/// One chronological entry in a session's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: HistoryEvent,
    pub message: String,
}

impl HistoryEntry {
    pub fn new(event: HistoryEvent, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
            message: message.into(),
        }
    }
}
