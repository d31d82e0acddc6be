//! Markdown renderer
//!
//! Renders artifacts and coverage reports through handlebars templates.
//! A template named `<name>.hbs` in the override directory wins over the
//! embedded default.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::{Handlebars, handlebars_helper};
use serde::Serialize;
use tracing::{debug, info};

use super::ArtifactRenderer;
use super::embedded;
use crate::coverage::CoverageReport;
use crate::domain::{Artifact, ArtifactBody};

handlebars_helper!(pct: |value: f64| format!("{:.1}%", value));

/// Template context for a single artifact
#[derive(Debug, Serialize)]
struct ArtifactContext<'a> {
    id: &'a str,
    title: &'a str,
    confidence_pct: String,
    generated_at: String,
    body: &'a ArtifactBody,
}

impl<'a> ArtifactContext<'a> {
    fn new(artifact: &'a Artifact) -> Self {
        Self {
            id: &artifact.id,
            title: &artifact.title,
            confidence_pct: format!("{:.0}", artifact.confidence * 100.0),
            generated_at: artifact.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            body: &artifact.body,
        }
    }
}

/// Renders artifacts as Markdown
pub struct MarkdownRenderer {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory (e.g., `.designflow/templates/`)
    template_dir: Option<PathBuf>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::embedded_only()
    }
}

impl MarkdownRenderer {
    /// Create a renderer that prefers templates from `template_dir`
    pub fn new(template_dir: Option<impl AsRef<Path>>) -> Self {
        let template_dir = template_dir
            .map(|d| d.as_ref().to_path_buf())
            .filter(|d| d.exists());
        Self {
            hbs: Self::engine(),
            template_dir,
        }
    }

    /// Create a renderer that only uses embedded templates
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            template_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.register_helper("pct", Box::new(pct));
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `{template_dir}/{name}.hbs`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref dir) = self.template_dir {
            let path = dir.join(format!("{}.hbs", name));
            if path.exists() {
                debug!("Loading template from override: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read template {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded template: {}", name);
            return Ok(content.to_string());
        }

        Err(eyre!("Template not found: {}", name))
    }

    fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        let template = self.load_template(name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", name, e))
    }
}

impl ArtifactRenderer for MarkdownRenderer {
    fn render_artifact(&self, artifact: &Artifact) -> Result<String> {
        info!("Rendering {} artifact '{}'", artifact.artifact_type, artifact.title);
        self.render(artifact.artifact_type.as_str(), &ArtifactContext::new(artifact))
    }

    fn render_coverage(&self, report: &CoverageReport) -> Result<String> {
        debug!(phase = %report.phase, "render_coverage: called");
        self.render("coverage", report)
    }
}
