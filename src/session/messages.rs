//! Session manager messages
//!
//! Commands and replies for the actor pattern.

use tokio::sync::oneshot;

use super::responses::{AdvanceResponse, GenerationResponse, PivotResponse, SessionResponse, ValidationResponse};
use crate::constraints::ConstraintSummary;
use crate::coverage::PhaseSubmission;
use crate::domain::{ArtifactType, SessionConfig};
use crate::error::EngineResult;

/// Commands sent to the SessionManager actor
#[derive(Debug)]
pub enum SessionCommand {
    Start {
        config: SessionConfig,
        constraint_config: Option<serde_json::Value>,
        reply: oneshot::Sender<EngineResult<SessionResponse>>,
    },
    Status {
        id: String,
        reply: oneshot::Sender<EngineResult<SessionResponse>>,
    },
    Advance {
        id: String,
        submission: PhaseSubmission,
        reply: oneshot::Sender<EngineResult<AdvanceResponse>>,
    },
    Validate {
        id: String,
        phase: String,
        submission: PhaseSubmission,
        reply: oneshot::Sender<EngineResult<ValidationResponse>>,
    },
    EvaluatePivot {
        id: String,
        content: String,
        reply: oneshot::Sender<EngineResult<PivotResponse>>,
    },
    GenerateArtifacts {
        id: String,
        types: Vec<ArtifactType>,
        reply: oneshot::Sender<EngineResult<GenerationResponse>>,
    },
    LoadConstraints {
        config: serde_json::Value,
        reply: oneshot::Sender<EngineResult<ConstraintSummary>>,
    },
    ListActive {
        reply: oneshot::Sender<Vec<String>>,
    },
    Rollback {
        id: String,
        target: String,
        reason: String,
        reply: oneshot::Sender<EngineResult<SessionResponse>>,
    },
    Skip {
        id: String,
        reason: String,
        reply: oneshot::Sender<EngineResult<AdvanceResponse>>,
    },
    Close {
        id: String,
        reason: String,
        reply: oneshot::Sender<EngineResult<SessionResponse>>,
    },
    Shutdown,
}
