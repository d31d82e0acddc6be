//! Phase sequence and per-phase records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Default phase names, in order
pub const DEFAULT_PHASES: [&str; 6] = [
    "discovery",
    "requirements",
    "architecture",
    "specification",
    "planning",
    "validation",
];

/// Ordered, non-empty list of unique phase names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PhaseSequence(Vec<String>);

impl Default for PhaseSequence {
    fn default() -> Self {
        Self(DEFAULT_PHASES.iter().map(|p| p.to_string()).collect())
    }
}

impl PhaseSequence {
    /// Build a sequence, rejecting empty lists, blank names and duplicates
    pub fn new<I, S>(phases: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phases: Vec<String> = phases.into_iter().map(|p| p.into().trim().to_lowercase()).collect();
        debug!(count = phases.len(), "PhaseSequence::new: called");

        if phases.is_empty() {
            return Err(EngineError::config("phase sequence must contain at least one phase"));
        }
        for (i, phase) in phases.iter().enumerate() {
            if phase.is_empty() {
                return Err(EngineError::config(format!("phase #{} has an empty name", i + 1)));
            }
            if phases[..i].contains(phase) {
                return Err(EngineError::config(format!("phase '{}' appears more than once", phase)));
            }
        }
        Ok(Self(phases))
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn last(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.0.iter().any(|p| p == phase)
    }

    /// Zero-based position of a phase
    pub fn position(&self, phase: &str) -> Option<usize> {
        self.0.iter().position(|p| p == phase)
    }

    /// The phase after `phase`, or None if it is the last one
    pub fn next(&self, phase: &str) -> Option<&str> {
        let pos = self.position(phase)?;
        self.0.get(pos + 1).map(String::as_str)
    }

    pub fn is_final(&self, phase: &str) -> bool {
        self.last() == phase
    }

    /// Phases strictly after `phase`
    pub fn after(&self, phase: &str) -> &[String] {
        match self.position(phase) {
            Some(pos) => &self.0[pos + 1..],
            None => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for PhaseSequence {
    type Error = EngineError;

    fn try_from(phases: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(phases)
    }
}

impl From<PhaseSequence> for Vec<String> {
    fn from(seq: PhaseSequence) -> Self {
        seq.0
    }
}

/// Status of a single phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseStatus {
    #[default]
    NotStarted,
    InProgress,
    Validated,
    Skipped,
}

impl PhaseStatus {
    /// Validated or skipped phases count as done for progress
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Validated | Self::Skipped)
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not-started"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Validated => write!(f, "validated"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Latest state of one phase within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: String,
    pub status: PhaseStatus,
    /// Most recently submitted content
    pub content: String,
    /// Overall coverage of the most recent submission
    pub coverage: f64,
    pub updated_at: DateTime<Utc>,
}

impl PhaseRecord {
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            status: PhaseStatus::NotStarted,
            content: String::new(),
            coverage: 0.0,
            updated_at: Utc::now(),
        }
    }

    /// Overwrite with a fresh submission
    pub fn record_submission(&mut self, content: &str, coverage: f64, status: PhaseStatus) {
        debug!(phase = %self.phase, coverage, %status, "PhaseRecord::record_submission: called");
        self.content = content.to_string();
        self.coverage = coverage;
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn set_status(&mut self, status: PhaseStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
