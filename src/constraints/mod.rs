//! Constraint registry
//!
//! Loads named constraints (category, mandatory flag, applicable phases) from
//! declarative YAML/JSON configuration and answers per-phase lookups. The
//! registry has no knowledge of sessions.

mod registry;

pub use registry::{Constraint, ConstraintRegistry, ConstraintSummary};
