//! Artifact rendering
//!
//! Renderers consume structured artifacts and coverage reports; the engine
//! never produces formatted text itself.

mod embedded;
mod markdown;

use eyre::Result;

use crate::coverage::CoverageReport;
use crate::domain::Artifact;

pub use markdown::MarkdownRenderer;

/// Turns structured engine output into a document dialect
pub trait ArtifactRenderer {
    fn render_artifact(&self, artifact: &Artifact) -> Result<String>;

    fn render_coverage(&self, report: &CoverageReport) -> Result<String>;
}
