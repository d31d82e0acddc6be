//! Scripted design sessions
//!
//! A scenario is a YAML document holding a session configuration, an
//! optional constraint configuration and a list of steps. Running it drives
//! a `SessionManager` through the steps in order and collects every
//! response.
//!
//! ```yaml
//! session:
//!   goal: Build a notification service
//!   requirements: [Deliver email notifications]
//! steps:
//!   - advance:
//!       content: Stakeholders are the support team.
//!   - validate:
//!       phase: requirements
//!       content: Email delivery within one minute.
//!   - generate:
//!       types: [adr]
//!   - status
//! ```

use std::fs;
use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::coverage::PhaseSubmission;
use crate::domain::{ArtifactType, SessionConfig};
use crate::error::EngineResult;
use crate::session::{
    AdvanceResponse, GenerationResponse, PivotResponse, SessionManager, SessionResponse, ValidationResponse,
};

/// A scripted session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Scenario {
    pub session: SessionConfig,

    /// Constraint configuration for this session only; the engine default
    /// registry applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<serde_json::Value>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One operation against the running session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Advance(PhaseSubmission),
    Validate {
        phase: String,
        #[serde(flatten)]
        submission: PhaseSubmission,
    },
    Pivot {
        content: String,
    },
    Generate {
        #[serde(default)]
        types: Vec<ArtifactType>,
    },
    Rollback {
        target: String,
        reason: String,
    },
    Skip {
        reason: String,
    },
    Close {
        reason: String,
    },
    Status,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Advance(_) => "advance",
            Self::Validate { .. } => "validate",
            Self::Pivot { .. } => "pivot",
            Self::Generate { .. } => "generate",
            Self::Rollback { .. } => "rollback",
            Self::Skip { .. } => "skip",
            Self::Close { .. } => "close",
            Self::Status => "status",
        }
    }
}

/// Response produced by a single step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum StepOutcome {
    Advance(AdvanceResponse),
    Validate(ValidationResponse),
    Pivot(PivotResponse),
    Generate(GenerationResponse),
    Rollback(SessionResponse),
    Skip(AdvanceResponse),
    Close(SessionResponse),
    Status(SessionResponse),
}

/// Everything a scenario run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRun {
    pub started: SessionResponse,
    pub steps: Vec<StepOutcome>,
    /// Session state after the last step
    #[serde(rename = "final")]
    pub finished: SessionResponse,
}

impl Scenario {
    /// Parse a scenario from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse scenario")
    }

    /// Read and parse a scenario file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(?path, "Scenario::load: called");
        let content = fs::read_to_string(path).context(format!("Failed to read scenario {}", path.display()))?;
        Self::from_yaml_str(&content).context(format!("Invalid scenario {}", path.display()))
    }

    /// Start the session and run every step; stops at the first error
    pub async fn run(self, manager: &SessionManager) -> EngineResult<ScenarioRun> {
        debug!(goal = %self.session.goal, steps = self.steps.len(), "Scenario::run: called");
        let started = manager.start(self.session, self.constraints).await?;
        let id = started.session_id.clone();

        let mut outcomes = Vec::with_capacity(self.steps.len());
        for (i, step) in self.steps.into_iter().enumerate() {
            debug!(session_id = %id, step = i + 1, name = step.name(), "Scenario::run: step");
            outcomes.push(run_step(manager, &id, step).await?);
        }

        let finished = manager.status(&id).await?;
        info!(session_id = %id, steps = outcomes.len(), status = %finished.status, "Scenario finished");
        Ok(ScenarioRun {
            started,
            steps: outcomes,
            finished,
        })
    }
}

async fn run_step(manager: &SessionManager, id: &str, step: Step) -> EngineResult<StepOutcome> {
    let outcome = match step {
        Step::Advance(submission) => StepOutcome::Advance(manager.advance(id, submission).await?),
        Step::Validate { phase, submission } => StepOutcome::Validate(manager.validate(id, &phase, submission).await?),
        Step::Pivot { content } => StepOutcome::Pivot(manager.evaluate_pivot(id, &content).await?),
        Step::Generate { types } => StepOutcome::Generate(manager.generate_artifacts(id, types).await?),
        Step::Rollback { target, reason } => StepOutcome::Rollback(manager.rollback(id, &target, &reason).await?),
        Step::Skip { reason } => StepOutcome::Skip(manager.skip(id, &reason).await?),
        Step::Close { reason } => StepOutcome::Close(manager.close(id, &reason).await?),
        Step::Status => StepOutcome::Status(manager.status(id).await?),
    };
    Ok(outcome)
}
