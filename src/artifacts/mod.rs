//! Artifact generation
//!
//! Builds decision records, specifications and roadmaps as structured data.
//! Rendering lives in `crate::render`.

mod generator;

pub use generator::{ArtifactGenerator, GenerationResult, GenerationWarning, MINIMAL_CONFIDENCE};
