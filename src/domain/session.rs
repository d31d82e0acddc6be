//! Session aggregate
//!
//! A session is created by the engine at start, mutated only through engine
//! operations, and never deleted; it ends up `completed` or `failed`.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::artifact::Artifact;
use super::history::{HistoryEntry, HistoryEvent};
use super::phase::{PhaseRecord, PhaseSequence, PhaseStatus};
use crate::constraints::ConstraintRegistry;
use crate::coverage::{CoverageCalculator, CoverageReport, CoverageSnapshot};
use crate::error::{EngineError, EngineResult};
use crate::methodology::{MethodologySelection, ProjectSignals};

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    #[default]
    Initializing,
    Active,
    /// Last advance was refused; the phase pointer did not move
    Blocked,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Active => write!(f, "active"),
            Self::Blocked => write!(f, "blocked"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Caller-supplied session configuration; immutable after start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionConfig {
    /// Generated from the goal when absent
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub context: String,
    pub goal: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Constraint ids the session is held to; empty means every registered constraint
    #[serde(default)]
    pub constraints: Vec<String>,
    /// 0 to 100; the engine default applies when absent
    #[serde(default)]
    pub coverage_threshold: Option<f64>,
    #[serde(default = "default_true")]
    pub enable_pivots: bool,
    #[serde(default)]
    pub output_formats: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub signals: Option<ProjectSignals>,
}

impl SessionConfig {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            id: None,
            context: String::new(),
            goal: goal.into(),
            requirements: Vec::new(),
            constraints: Vec::new(),
            coverage_threshold: None,
            enable_pivots: true,
            output_formats: Vec::new(),
            metadata: BTreeMap::new(),
            signals: None,
        }
    }

    /// Reject configurations a session cannot be built from
    pub fn validate(&self) -> EngineResult<()> {
        if self.goal.trim().is_empty() {
            return Err(EngineError::config("session goal must not be empty"));
        }
        if let Some(id) = &self.id
            && id.trim().is_empty()
        {
            return Err(EngineError::config("session id must not be blank"));
        }
        if let Some(threshold) = self.coverage_threshold
            && !(0.0..=100.0).contains(&threshold)
        {
            return Err(EngineError::config(format!(
                "coverage threshold must be between 0 and 100, got {}",
                threshold
            )));
        }
        if let Some(i) = self.requirements.iter().position(|r| r.trim().is_empty()) {
            return Err(EngineError::config(format!("requirement #{} is empty", i + 1)));
        }
        Ok(())
    }
}

/// The root aggregate
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub config: SessionConfig,
    /// Phase order fixed at creation
    pub phases: PhaseSequence,
    pub current_phase: String,
    pub status: SessionStatus,
    /// Effective coverage threshold
    pub threshold: f64,
    /// Constraints this session is held to
    pub constraints: ConstraintRegistry,
    pub methodology: Option<MethodologySelection>,
    records: HashMap<String, PhaseRecord>,
    /// Report from the most recent advance attempt, whichever phase it scored
    pub last_report: Option<CoverageReport>,
    pub artifacts: Vec<Artifact>,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Build a session in the `initializing` state
    pub fn new(
        id: impl Into<String>,
        config: SessionConfig,
        phases: PhaseSequence,
        threshold: f64,
        constraints: ConstraintRegistry,
    ) -> Self {
        let now = Utc::now();
        let current_phase = phases.first().to_string();
        Self {
            id: id.into(),
            config,
            phases,
            current_phase,
            status: SessionStatus::Initializing,
            threshold,
            constraints,
            methodology: None,
            records: HashMap::new(),
            last_report: None,
            artifacts: Vec::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append to the history log
    pub fn record(&mut self, event: HistoryEvent, message: impl Into<String>) {
        let entry = HistoryEntry::new(event, message);
        debug!(session_id = %self.id, event = entry.event.name(), "Session::record: called");
        self.updated_at = entry.timestamp;
        self.history.push(entry);
    }

    pub fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Record for a phase, if one was ever created
    pub fn phase_record(&self, phase: &str) -> Option<&PhaseRecord> {
        self.records.get(phase)
    }

    /// Record for a phase, created on first use
    pub fn phase_record_mut(&mut self, phase: &str) -> &mut PhaseRecord {
        self.records
            .entry(phase.to_string())
            .or_insert_with(|| PhaseRecord::new(phase))
    }

    /// Status of a phase; phases without a record have not started
    pub fn phase_status(&self, phase: &str) -> PhaseStatus {
        self.records.get(phase).map(|r| r.status).unwrap_or_default()
    }

    /// Existing records in phase order
    pub fn records_in_order(&self) -> Vec<&PhaseRecord> {
        self.phases.iter().filter_map(|p| self.records.get(p)).collect()
    }

    /// Reset every record after `phase` to `not-started`
    pub fn reset_after(&mut self, phase: &str) -> Vec<String> {
        let later: Vec<String> = self.phases.after(phase).to_vec();
        let mut reset = Vec::new();
        for name in later {
            if let Some(record) = self.records.get_mut(&name)
                && record.status != PhaseStatus::NotStarted
            {
                record.set_status(PhaseStatus::NotStarted);
                reset.push(name);
            }
        }
        reset
    }

    /// Content of validated phases, in phase order
    pub fn validated_content(&self) -> Vec<(&str, &str)> {
        self.records_in_order()
            .into_iter()
            .filter(|r| r.status == PhaseStatus::Validated && !r.content.trim().is_empty())
            .map(|r| (r.phase.as_str(), r.content.as_str()))
            .collect()
    }

    /// Freshly computed coverage snapshot
    pub fn coverage(&self, calculator: &CoverageCalculator) -> CoverageSnapshot {
        CoverageSnapshot::compute(
            calculator,
            &self.phases,
            self.records_in_order(),
            self.last_report.as_ref(),
        )
    }

    /// Still accepting phase operations
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Number of blocked advances recorded for a phase
    pub fn blocked_count(&self, phase: &str) -> usize {
        self.history
            .iter()
            .filter(|h| matches!(&h.event, HistoryEvent::AdvanceBlocked { phase: p, .. } if p == phase))
            .count()
    }

    /// Coverage scores of every advance attempt, oldest first
    pub fn score_trend(&self) -> Vec<f64> {
        self.history
            .iter()
            .filter_map(|h| match &h.event {
                HistoryEvent::PhaseValidated { coverage, .. } | HistoryEvent::AdvanceBlocked { coverage, .. } => {
                    Some(*coverage)
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let registry = ConstraintRegistry::from_constraints(vec![]).unwrap();
        Session::new(
            "s1",
            SessionConfig::new("Build a billing service"),
            PhaseSequence::default(),
            80.0,
            registry,
        )
    }

    #[test]
    fn test_new_session_starts_at_first_phase() {
        let s = session();
        assert_eq!(s.current_phase, "discovery");
        assert_eq!(s.status, SessionStatus::Initializing);
        assert_eq!(s.phase_status("discovery"), PhaseStatus::NotStarted);
        assert!(s.phase_record("discovery").is_none());
        assert!(s.is_active());
    }

    #[test]
    fn test_config_validation() {
        assert!(SessionConfig::new("goal").validate().is_ok());
        assert!(SessionConfig::new("  ").validate().is_err());

        let mut config = SessionConfig::new("goal");
        config.coverage_threshold = Some(101.0);
        assert!(matches!(config.validate(), Err(EngineError::Configuration(_))));

        let mut config = SessionConfig::new("goal");
        config.requirements = vec!["ok".into(), " ".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let yaml = r#"
goal: Replace the reporting pipeline
requirements:
  - Nightly exports
coverage-threshold: 85
"#;
        let config: SessionConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.enable_pivots);
        assert_eq!(config.coverage_threshold, Some(85.0));
        assert!(config.signals.is_none());
        assert!(config.constraints.is_empty());
    }

    #[test]
    fn test_reset_after() {
        let mut s = session();
        s.phase_record_mut("discovery").set_status(PhaseStatus::Validated);
        s.phase_record_mut("requirements").set_status(PhaseStatus::Validated);
        s.phase_record_mut("architecture").set_status(PhaseStatus::InProgress);

        let reset = s.reset_after("discovery");
        assert_eq!(reset, vec!["requirements".to_string(), "architecture".to_string()]);
        assert_eq!(s.phase_status("discovery"), PhaseStatus::Validated);
        assert_eq!(s.phase_status("architecture"), PhaseStatus::NotStarted);
    }

    #[test]
    fn test_history_queries() {
        let mut s = session();
        s.record(
            HistoryEvent::AdvanceBlocked {
                phase: "discovery".into(),
                coverage: 40.0,
                reasons: vec![],
            },
            "blocked",
        );
        s.record(
            HistoryEvent::PhaseValidated {
                phase: "discovery".into(),
                coverage: 90.0,
            },
            "validated",
        );
        assert_eq!(s.blocked_count("discovery"), 1);
        assert_eq!(s.blocked_count("requirements"), 0);
        assert_eq!(s.score_trend(), vec![40.0, 90.0]);
    }
}
