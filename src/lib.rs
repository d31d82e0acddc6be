//! designflow - Design Session Orchestration Engine
//!
//! designflow walks a design effort through an ordered sequence of phases
//! (discovery, requirements, architecture, specification, planning,
//! validation). Each submission is scored for coverage; a phase is only left
//! once its score meets the session threshold and every mandatory constraint
//! for it is satisfied.
//!
//! # Core Concepts
//!
//! - **Coverage Gate**: weighted requirements, constraints, documentation and testing scores
//! - **Constraints**: named rules per phase; mandatory ones block advancement
//! - **Methodology**: picked once at start from project signals
//! - **Pivots**: advisory continue/change-direction decisions from accumulated signals
//! - **Artifacts**: decision records, specifications and roadmaps as structured data
//!
//! # Modules
//!
//! - [`session`] - Engine facade and the async `SessionManager` actor
//! - [`workflow`] - Phase state machine
//! - [`coverage`] - Coverage scoring and the keyword rule table
//! - [`constraints`] - Constraint registry
//! - [`methodology`] - Methodology selection from project signals
//! - [`pivot`] - Pivot decision engine
//! - [`artifacts`] - Artifact generation
//! - [`render`] - Markdown rendering of artifacts and coverage
//! - [`scenario`] - Scripted sessions driven from YAML
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod constraints;
pub mod coverage;
pub mod domain;
pub mod error;
pub mod methodology;
pub mod pivot;
pub mod render;
pub mod scenario;
pub mod session;
pub mod workflow;

// Re-export commonly used types
pub use artifacts::{ArtifactGenerator, GenerationResult, GenerationWarning};
pub use config::Config;
pub use constraints::{Constraint, ConstraintRegistry, ConstraintSummary};
pub use coverage::{CoverageCalculator, CoverageReport, CoverageSnapshot, PhaseSubmission, TestEvidence};
pub use domain::{
    Artifact, ArtifactType, HistoryEntry, HistoryEvent, PhaseRecord, PhaseSequence, PhaseStatus, Session,
    SessionConfig, SessionStatus,
};
pub use error::{EngineError, EngineResult};
pub use methodology::{Methodology, MethodologySelection, ProjectSignals};
pub use pivot::{PivotDecision, PivotEngine, Severity};
pub use render::{ArtifactRenderer, MarkdownRenderer};
pub use scenario::{Scenario, ScenarioRun, Step, StepOutcome};
pub use session::{
    AdvanceResponse, DesignEngine, GenerationResponse, PivotResponse, SessionManager, SessionResponse, SessionStore,
    ValidationResponse,
};
pub use workflow::{AdvanceOutcome, PhaseWorkflow};
