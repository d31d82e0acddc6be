//! Phase workflow state machine

mod machine;

pub use machine::{AdvanceOutcome, PhaseWorkflow};
