//! Domain types for designflow
//!
//! Core domain types: Session, PhaseRecord, HistoryEntry, Artifact.
//! Sessions are held in memory for the lifetime of the process.

mod artifact;
mod history;
mod id;
mod phase;
mod session;

pub use artifact::{
    Artifact, ArtifactBody, ArtifactType, ConstraintEntry, DecisionRecord, DecisionStatus, Milestone, PhaseNote,
    RequirementEntry, Roadmap, SpecificationDoc,
};
pub use history::{HistoryEntry, HistoryEvent};
pub use id::{generate_id, slugify};
pub use phase::{DEFAULT_PHASES, PhaseRecord, PhaseSequence, PhaseStatus};
pub use session::{Session, SessionConfig, SessionStatus};
