//! designflow configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::DEFAULT_PHASES;

/// Main designflow configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Phase sequence and advancement gate
    pub workflow: WorkflowConfig,

    /// Coverage heuristics
    pub coverage: CoverageConfig,

    /// Pivot decision thresholds
    pub pivot: PivotConfig,

    /// Constraint source
    pub constraints: ConstraintsConfig,

    /// Artifact rendering
    pub render: RenderConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.workflow.phases.is_empty() {
            return Err(eyre::eyre!("workflow.phases must name at least one phase"));
        }
        let mut seen = HashSet::new();
        for phase in &self.workflow.phases {
            let normalized = phase.trim().to_lowercase();
            if normalized.is_empty() {
                return Err(eyre::eyre!("workflow.phases contains a blank phase name"));
            }
            if !seen.insert(normalized) {
                return Err(eyre::eyre!("workflow.phases contains duplicate phase '{}'", phase));
            }
        }
        if !(0.0..=100.0).contains(&self.workflow.coverage_threshold) {
            return Err(eyre::eyre!(
                "workflow.coverage-threshold must be between 0 and 100, got {}",
                self.workflow.coverage_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.coverage.keyword_match_ratio) || self.coverage.keyword_match_ratio == 0.0 {
            return Err(eyre::eyre!(
                "coverage.keyword-match-ratio must be in (0, 1], got {}",
                self.coverage.keyword_match_ratio
            ));
        }
        if self.coverage.word_target == 0 {
            return Err(eyre::eyre!("coverage.word-target must be greater than 0"));
        }
        if self.pivot.threshold <= 0.0 {
            return Err(eyre::eyre!("pivot.threshold must be positive, got {}", self.pivot.threshold));
        }
        if self.pivot.trend_window < 2 {
            return Err(eyre::eyre!("pivot.trend-window must be at least 2"));
        }
        if self.pivot.failure_limit == 0 {
            return Err(eyre::eyre!("pivot.failure-limit must be greater than 0"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .designflow.yml
        let local_config = PathBuf::from(".designflow.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/designflow/designflow.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("designflow").join("designflow.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Phase sequence and advancement gate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Ordered phase names
    pub phases: Vec<String>,

    /// Default coverage threshold for sessions that don't set one
    #[serde(rename = "coverage-threshold")]
    pub coverage_threshold: f64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            phases: DEFAULT_PHASES.iter().map(|p| p.to_string()).collect(),
            coverage_threshold: 70.0,
        }
    }
}

/// Coverage heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Fraction of a statement's keywords that must appear for it to count
    #[serde(rename = "keyword-match-ratio")]
    pub keyword_match_ratio: f64,

    /// Word count at which the length part of documentation maxes out
    #[serde(rename = "word-target")]
    pub word_target: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            keyword_match_ratio: 0.5,
            word_target: 400,
        }
    }
}

/// Pivot decision thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    /// Weighted indicator total at which a pivot is recommended
    pub threshold: f64,

    /// Number of recent phase scores inspected for a declining trend
    #[serde(rename = "trend-window")]
    pub trend_window: usize,

    /// Blocked advances on one phase before they count as an indicator
    #[serde(rename = "failure-limit")]
    pub failure_limit: usize,
}

impl Default for PivotConfig {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            trend_window: 3,
            failure_limit: 2,
        }
    }
}

/// Constraint source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintsConfig {
    /// YAML or JSON constraint file; the embedded default set when unset
    pub path: Option<PathBuf>,
}

/// Artifact rendering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory whose `<name>.hbs` files override the embedded templates
    #[serde(rename = "template-dir")]
    pub template_dir: Option<PathBuf>,
}
