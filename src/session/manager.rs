//! SessionManager - actor that owns the engine and its session store
//!
//! Commands are processed one at a time, so operations on the same session
//! never interleave.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::engine::DesignEngine;
use super::messages::SessionCommand;
use super::responses::{AdvanceResponse, GenerationResponse, PivotResponse, SessionResponse, ValidationResponse};
use crate::constraints::ConstraintSummary;
use crate::coverage::PhaseSubmission;
use crate::domain::{ArtifactType, SessionConfig};
use crate::error::{EngineError, EngineResult};

/// Handle to send commands to the SessionManager
#[derive(Clone)]
pub struct SessionManager {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionManager {
    /// Spawn a new SessionManager actor around an engine
    pub fn spawn(engine: DesignEngine) -> Self {
        debug!("spawn: called");
        let (tx, rx) = mpsc::channel(256);

        tokio::spawn(actor_loop(engine, rx));

        info!("SessionManager spawned");
        Self { tx }
    }

    /// Send a command and wait for its reply
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelError)?;
        reply_rx.await.map_err(|_| EngineError::ChannelError)
    }

    /// Start a session
    pub async fn start(
        &self,
        config: SessionConfig,
        constraint_config: Option<serde_json::Value>,
    ) -> EngineResult<SessionResponse> {
        debug!(goal = %config.goal, "start: called");
        self.request(|reply| SessionCommand::Start {
            config,
            constraint_config,
            reply,
        })
        .await?
    }

    /// Get the status of a session
    pub async fn status(&self, id: &str) -> EngineResult<SessionResponse> {
        debug!(%id, "status: called");
        self.request(|reply| SessionCommand::Status { id: id.to_string(), reply })
            .await?
    }

    /// Submit content for the current phase
    pub async fn advance(&self, id: &str, submission: PhaseSubmission) -> EngineResult<AdvanceResponse> {
        debug!(%id, "advance: called");
        self.request(|reply| SessionCommand::Advance {
            id: id.to_string(),
            submission,
            reply,
        })
        .await?
    }

    /// Score content for a phase without changing the session
    pub async fn validate(&self, id: &str, phase: &str, submission: PhaseSubmission) -> EngineResult<ValidationResponse> {
        debug!(%id, %phase, "validate: called");
        self.request(|reply| SessionCommand::Validate {
            id: id.to_string(),
            phase: phase.to_string(),
            submission,
            reply,
        })
        .await?
    }

    /// Ask whether the session should change direction
    pub async fn evaluate_pivot(&self, id: &str, content: &str) -> EngineResult<PivotResponse> {
        debug!(%id, "evaluate_pivot: called");
        self.request(|reply| SessionCommand::EvaluatePivot {
            id: id.to_string(),
            content: content.to_string(),
            reply,
        })
        .await?
    }

    /// Generate artifacts; an empty list generates the full bundle
    pub async fn generate_artifacts(&self, id: &str, types: Vec<ArtifactType>) -> EngineResult<GenerationResponse> {
        debug!(%id, ?types, "generate_artifacts: called");
        self.request(|reply| SessionCommand::GenerateArtifacts {
            id: id.to_string(),
            types,
            reply,
        })
        .await?
    }

    /// Replace the default constraint registry
    pub async fn load_constraints(&self, config: serde_json::Value) -> EngineResult<ConstraintSummary> {
        debug!("load_constraints: called");
        self.request(|reply| SessionCommand::LoadConstraints { config, reply })
            .await?
    }

    /// Ids of sessions still in progress
    pub async fn list_active(&self) -> EngineResult<Vec<String>> {
        debug!("list_active: called");
        self.request(|reply| SessionCommand::ListActive { reply }).await
    }

    /// Roll back to an earlier phase
    pub async fn rollback(&self, id: &str, target: &str, reason: &str) -> EngineResult<SessionResponse> {
        debug!(%id, %target, "rollback: called");
        self.request(|reply| SessionCommand::Rollback {
            id: id.to_string(),
            target: target.to_string(),
            reason: reason.to_string(),
            reply,
        })
        .await?
    }

    /// Skip the current phase
    pub async fn skip(&self, id: &str, reason: &str) -> EngineResult<AdvanceResponse> {
        debug!(%id, "skip: called");
        self.request(|reply| SessionCommand::Skip {
            id: id.to_string(),
            reason: reason.to_string(),
            reply,
        })
        .await?
    }

    /// Mark a session failed
    pub async fn close(&self, id: &str, reason: &str) -> EngineResult<SessionResponse> {
        debug!(%id, "close: called");
        self.request(|reply| SessionCommand::Close {
            id: id.to_string(),
            reason: reason.to_string(),
            reply,
        })
        .await?
    }

    /// Shutdown the SessionManager
    pub async fn shutdown(&self) -> EngineResult<()> {
        debug!("shutdown: called");
        self.tx
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| EngineError::ChannelError)
    }
}

/// The actor loop that processes commands
async fn actor_loop(mut engine: DesignEngine, mut rx: mpsc::Receiver<SessionCommand>) {
    debug!("actor_loop: called");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            SessionCommand::Start {
                config,
                constraint_config,
                reply,
            } => {
                debug!(goal = %config.goal, "actor_loop: Start command");
                let _ = reply.send(engine.start(config, constraint_config));
            }

            SessionCommand::Status { id, reply } => {
                debug!(%id, "actor_loop: Status command");
                let _ = reply.send(engine.status(&id));
            }

            SessionCommand::Advance { id, submission, reply } => {
                debug!(%id, "actor_loop: Advance command");
                let _ = reply.send(engine.advance(&id, &submission));
            }

            SessionCommand::Validate {
                id,
                phase,
                submission,
                reply,
            } => {
                debug!(%id, %phase, "actor_loop: Validate command");
                let _ = reply.send(engine.validate(&id, &phase, &submission));
            }

            SessionCommand::EvaluatePivot { id, content, reply } => {
                debug!(%id, "actor_loop: EvaluatePivot command");
                let _ = reply.send(engine.evaluate_pivot(&id, &content));
            }

            SessionCommand::GenerateArtifacts { id, types, reply } => {
                debug!(%id, "actor_loop: GenerateArtifacts command");
                let _ = reply.send(engine.generate_artifacts(&id, &types));
            }

            SessionCommand::LoadConstraints { config, reply } => {
                debug!("actor_loop: LoadConstraints command");
                let _ = reply.send(engine.load_constraints(config));
            }

            SessionCommand::ListActive { reply } => {
                debug!("actor_loop: ListActive command");
                let _ = reply.send(engine.list_active());
            }

            SessionCommand::Rollback {
                id,
                target,
                reason,
                reply,
            } => {
                debug!(%id, %target, "actor_loop: Rollback command");
                let _ = reply.send(engine.rollback(&id, &target, &reason));
            }

            SessionCommand::Skip { id, reason, reply } => {
                debug!(%id, "actor_loop: Skip command");
                let _ = reply.send(engine.skip(&id, &reason));
            }

            SessionCommand::Close { id, reason, reply } => {
                debug!(%id, "actor_loop: Close command");
                let _ = reply.send(engine.close(&id, &reason));
            }

            SessionCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("SessionManager shutting down");
                break;
            }
        }
    }

    debug!("SessionManager actor stopped");
}
