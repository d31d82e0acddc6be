//! DesignEngine - synchronous session facade
//!
//! Composes the constraint registry, coverage calculator, phase workflow,
//! methodology selector, pivot engine and artifact generator behind one set
//! of operations. Every mutating operation is recorded in the session's
//! history. The async [`SessionManager`](super::SessionManager) wraps this
//! type in an actor.

use tracing::{debug, info, warn};

use super::responses::{AdvanceResponse, GenerationResponse, PivotResponse, SessionResponse, ValidationResponse};
use super::store::SessionStore;
use crate::artifacts::{ArtifactGenerator, GenerationResult};
use crate::config::Config;
use crate::constraints::{ConstraintRegistry, ConstraintSummary};
use crate::coverage::{CoverageCalculator, PhaseSubmission};
use crate::domain::{
    ArtifactType, HistoryEvent, PhaseSequence, Session, SessionConfig, SessionStatus, generate_id,
};
use crate::error::{EngineError, EngineResult};
use crate::methodology::select;
use crate::pivot::PivotEngine;
use crate::workflow::PhaseWorkflow;

/// Metadata key under which the selected methodology is mirrored
pub const METHODOLOGY_METADATA_KEY: &str = "methodology";

pub struct DesignEngine {
    phases: PhaseSequence,
    default_threshold: f64,
    /// Constraints used by sessions started without their own configuration
    registry: ConstraintRegistry,
    workflow: PhaseWorkflow,
    pivot: PivotEngine,
    generator: ArtifactGenerator,
    store: SessionStore,
}

impl DesignEngine {
    /// Build an engine from configuration, an initial registry and a store
    ///
    /// Fails with a configuration error when `config` does not validate.
    pub fn new(config: &Config, registry: ConstraintRegistry, store: SessionStore) -> EngineResult<Self> {
        debug!(phases = config.workflow.phases.len(), "DesignEngine::new: called");
        config.validate().map_err(EngineError::config)?;
        let phases = PhaseSequence::new(config.workflow.phases.clone())?;
        for (id, phase) in unknown_phases(&phases, &registry) {
            warn!(constraint = %id, %phase, "Constraint names a phase outside the sequence; it will never apply");
        }
        let calculator = CoverageCalculator::new(config.coverage.clone());
        Ok(Self {
            phases,
            default_threshold: config.workflow.coverage_threshold,
            registry,
            workflow: PhaseWorkflow::new(calculator),
            pivot: PivotEngine::new(config.pivot.clone()),
            generator: ArtifactGenerator::new(config.coverage.keyword_match_ratio),
            store,
        })
    }

    /// Build an engine with the configured (or builtin) constraints and an empty store
    pub fn from_config(config: &Config) -> EngineResult<Self> {
        let registry = match &config.constraints.path {
            Some(path) => ConstraintRegistry::from_file(path)?,
            None => ConstraintRegistry::builtin()?,
        };
        Self::new(config, registry, SessionStore::new())
    }

    fn calculator(&self) -> &CoverageCalculator {
        self.workflow.calculator()
    }

    /// Read-only access to a session
    pub fn session(&self, id: &str) -> EngineResult<&Session> {
        self.store.get(id)
    }

    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    pub fn phases(&self) -> &PhaseSequence {
        &self.phases
    }

    /// Create a session
    ///
    /// Fails with a configuration error, and creates nothing, when the
    /// session or constraint configuration is invalid.
    pub fn start(
        &mut self,
        mut config: SessionConfig,
        constraint_config: Option<serde_json::Value>,
    ) -> EngineResult<SessionResponse> {
        debug!(goal = %config.goal, has_constraint_config = constraint_config.is_some(), "start: called");
        config.validate()?;

        let registry = match constraint_config {
            Some(value) => {
                let registry = ConstraintRegistry::from_value(value)?;
                reject_unknown_phases(&self.phases, &registry)?;
                registry
            }
            None => self.registry.clone(),
        };
        let registry = if config.constraints.is_empty() {
            registry
        } else {
            registry.restrict(&config.constraints)?
        };

        let id = match &config.id {
            Some(id) => id.trim().to_string(),
            None => generate_id("session", &config.goal),
        };
        if self.store.contains(&id) {
            return Err(EngineError::config(format!("session '{}' already exists", id)));
        }

        let selection = config.signals.as_ref().map(select);
        if let Some(selection) = &selection {
            config
                .metadata
                .insert(METHODOLOGY_METADATA_KEY.to_string(), selection.methodology.to_string());
        }

        let threshold = config.coverage_threshold.unwrap_or(self.default_threshold);
        let mut session = Session::new(id, config, self.phases.clone(), threshold, registry);
        session.set_status(SessionStatus::Active);
        session.record(
            HistoryEvent::SessionStarted,
            format!("Session started for goal: {}", session.config.goal),
        );

        if let Some(selection) = selection {
            session.record(
                HistoryEvent::MethodologySelected {
                    methodology: selection.methodology.to_string(),
                },
                format!("Methodology {} selected: {}", selection.methodology, selection.rationale),
            );
            session.methodology = Some(selection);
            let result = self.generator.generate(&session, &[ArtifactType::Adr]);
            append_generated(&mut session, &result);
        }

        let recommendations = start_recommendations(&session);
        let response = SessionResponse::new(&session, session.coverage(self.calculator()), recommendations);
        info!(
            session_id = %session.id,
            phases = session.phases.len(),
            constraints = session.constraints.len(),
            threshold,
            "Session started"
        );
        self.store.insert(session)?;
        Ok(response)
    }

    /// Current state of a session
    pub fn status(&self, id: &str) -> EngineResult<SessionResponse> {
        debug!(%id, "status: called");
        let session = self.store.get(id)?;
        let recommendations = status_recommendations(session);
        Ok(SessionResponse::new(
            session,
            session.coverage(self.calculator()),
            recommendations,
        ))
    }

    /// Score the current phase and advance if the gate is met
    pub fn advance(&mut self, id: &str, submission: &PhaseSubmission) -> EngineResult<AdvanceResponse> {
        debug!(%id, "advance: called");
        let session = self.store.get_mut(id)?;
        let outcome = self.workflow.advance(session, submission)?;
        Ok(AdvanceResponse::new(id, outcome))
    }

    /// Score a submission for any phase without changing the session
    pub fn validate(&self, id: &str, phase: &str, submission: &PhaseSubmission) -> EngineResult<ValidationResponse> {
        debug!(%id, %phase, "validate: called");
        let session = self.store.get(id)?;
        let report = self.workflow.validate(session, phase, submission)?;
        let would_advance = report.meets(session.threshold) && report.unsatisfied_constraints.is_empty();
        Ok(ValidationResponse {
            session_id: id.to_string(),
            report,
            would_advance,
        })
    }

    /// Continue/pivot recommendation for the current phase
    pub fn evaluate_pivot(&mut self, id: &str, content: &str) -> EngineResult<PivotResponse> {
        debug!(%id, "evaluate_pivot: called");
        let session = self.store.get_mut(id)?;
        let decision = self.pivot.evaluate(session, content);
        session.record(
            HistoryEvent::PivotEvaluated {
                recommend_pivot: decision.recommend_pivot,
                indicators: decision.indicators.len(),
            },
            decision.rationale.clone(),
        );
        Ok(PivotResponse {
            session_id: id.to_string(),
            decision,
        })
    }

    /// Generate artifacts; an empty type list means the full bundle
    pub fn generate_artifacts(&mut self, id: &str, types: &[ArtifactType]) -> EngineResult<GenerationResponse> {
        debug!(%id, ?types, "generate_artifacts: called");
        let session = self.store.get_mut(id)?;
        let result = if types.is_empty() {
            self.generator.bundle(session)
        } else {
            self.generator.generate(session, types)
        };
        append_generated(session, &result);
        Ok(GenerationResponse {
            session_id: id.to_string(),
            artifacts: result.artifacts,
            warnings: result.warnings,
        })
    }

    /// Replace the default constraint registry
    ///
    /// All-or-nothing: on error the previous registry stays in place.
    /// Existing sessions keep the constraints they were started with.
    pub fn load_constraints(&mut self, config: serde_json::Value) -> EngineResult<ConstraintSummary> {
        debug!("load_constraints: called");
        let registry = ConstraintRegistry::from_value(config)?;
        reject_unknown_phases(&self.phases, &registry)?;
        let summary = registry.summary();
        self.registry = registry;
        info!(
            accepted = summary.accepted,
            mandatory = summary.mandatory,
            "Constraint registry replaced"
        );
        Ok(summary)
    }

    /// Ids of sessions that are neither completed nor failed, oldest first
    pub fn list_active(&self) -> Vec<String> {
        debug!("list_active: called");
        self.store.ids_where(|s| !s.status.is_terminal())
    }

    /// Move a session back to an earlier phase
    pub fn rollback(&mut self, id: &str, target: &str, reason: &str) -> EngineResult<SessionResponse> {
        debug!(%id, %target, "rollback: called");
        let session = self.store.get_mut(id)?;
        self.workflow.rollback(session, target, reason)?;
        self.status(id)
    }

    /// Skip the current phase
    pub fn skip(&mut self, id: &str, reason: &str) -> EngineResult<AdvanceResponse> {
        debug!(%id, "skip: called");
        let session = self.store.get_mut(id)?;
        let outcome = self.workflow.skip(session, reason)?;
        Ok(AdvanceResponse::new(id, outcome))
    }

    /// Abandon a session; it is marked failed and kept
    pub fn close(&mut self, id: &str, reason: &str) -> EngineResult<SessionResponse> {
        debug!(%id, "close: called");
        let session = self.store.get_mut(id)?;
        if session.status.is_terminal() {
            return Err(EngineError::InvalidTransition(format!(
                "session {} is already {}",
                id, session.status
            )));
        }
        session.set_status(SessionStatus::Failed);
        session.record(HistoryEvent::SessionFailed, format!("Session closed: {}", reason));
        warn!(session_id = %id, %reason, "Session closed");
        self.status(id)
    }
}

/// (constraint id, phase) pairs where the phase is not in the sequence
fn unknown_phases(phases: &PhaseSequence, registry: &ConstraintRegistry) -> Vec<(String, String)> {
    registry
        .all()
        .iter()
        .flat_map(|c| {
            c.phases
                .iter()
                .filter(|p| !phases.contains(p))
                .map(move |p| (c.id.clone(), p.clone()))
        })
        .collect()
}

fn reject_unknown_phases(phases: &PhaseSequence, registry: &ConstraintRegistry) -> EngineResult<()> {
    match unknown_phases(phases, registry).into_iter().next() {
        Some((id, phase)) => Err(EngineError::config(format!(
            "constraint '{}' names unknown phase '{}'",
            id, phase
        ))),
        None => Ok(()),
    }
}

fn append_generated(session: &mut Session, result: &GenerationResult) {
    let generated: Vec<String> = result.artifacts.iter().map(|a| a.artifact_type.to_string()).collect();
    session.artifacts.extend(result.artifacts.iter().cloned());
    session.record(
        HistoryEvent::ArtifactsGenerated {
            generated: generated.clone(),
            warnings: result.warnings.len(),
        },
        if generated.is_empty() {
            "No artifacts generated".to_string()
        } else {
            format!("Generated {}", generated.join(", "))
        },
    );
}

fn start_recommendations(session: &Session) -> Vec<String> {
    let mut out = vec![format!("Begin with the {} phase", session.current_phase)];
    if session.config.requirements.is_empty() {
        out.push("Declare requirements so requirement coverage can be measured".to_string());
    }
    if let Some(selection) = &session.methodology {
        for practice in selection.methodology.practices() {
            out.push(format!("{}: {}", selection.methodology, practice));
        }
    }
    out.extend(mandatory_recommendations(session));
    out
}

fn status_recommendations(session: &Session) -> Vec<String> {
    match session.status {
        SessionStatus::Completed => vec!["Generate the final artifact bundle".to_string()],
        SessionStatus::Failed => vec!["Start a new session".to_string()],
        SessionStatus::Blocked => {
            let mut out = vec![format!(
                "Revise the {} submission to reach {:.1}% coverage",
                session.current_phase, session.threshold
            )];
            if let Some(report) = &session.last_report {
                out.extend(report.missing_requirements.iter().map(|r| format!("Cover requirement: {}", r)));
            }
            out.extend(mandatory_recommendations(session));
            out
        }
        SessionStatus::Initializing | SessionStatus::Active => {
            let mut out = vec![format!("Submit content for the {} phase", session.current_phase)];
            out.extend(mandatory_recommendations(session));
            out
        }
    }
}

fn mandatory_recommendations(session: &Session) -> Vec<String> {
    session
        .constraints
        .mandatory_for(&session.current_phase)
        .into_iter()
        .map(|c| format!("Address mandatory constraint {}: {}", c.id, c.description))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PhaseStatus;
    use crate::methodology::{Methodology, ProjectSignals};
    use serde_json::json;

    fn engine() -> DesignEngine {
        DesignEngine::new(&Config::default(), ConstraintRegistry::default(), SessionStore::new()).unwrap()
    }

    fn config(id: &str) -> SessionConfig {
        let mut config = SessionConfig::new("Build a reporting service");
        config.id = Some(id.to_string());
        config
    }

    #[test]
    fn test_start_and_status() {
        let mut engine = engine();
        let started = engine.start(config("s1"), None).unwrap();
        assert_eq!(started.session_id, "s1");
        assert_eq!(started.status, SessionStatus::Active);
        assert_eq!(started.current_phase, "discovery");
        assert!(started.artifacts.is_empty());

        let status = engine.status("s1").unwrap();
        assert_eq!(status.current_phase, "discovery");
        assert_eq!(engine.session("s1").unwrap().history.len(), 1);
    }

    #[test]
    fn test_generated_id_when_absent() {
        let mut engine = engine();
        let response = engine.start(SessionConfig::new("Reporting service"), None).unwrap();
        assert!(response.session_id.contains("-session-reporting-service"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut engine = engine();
        engine.start(config("s1"), None).unwrap();
        let err = engine.start(config("s1"), None).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_bad_constraint_config_creates_nothing() {
        let mut engine = engine();
        let bad = json!({"id": "not-a-list"});
        let err = engine.start(config("s1"), Some(bad)).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        assert!(engine.status("s1").is_err());
        assert!(engine.list_active().is_empty());
    }

    #[test]
    fn test_unknown_constraint_id_rejected() {
        let mut engine = engine();
        let mut cfg = config("s1");
        cfg.constraints = vec!["does-not-exist".into()];
        assert!(matches!(engine.start(cfg, None), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let mut config = Config::default();
        config.pivot.threshold = 0.0;
        let err = DesignEngine::new(&config, ConstraintRegistry::default(), SessionStore::new()).err();
        assert!(matches!(err, Some(EngineError::Configuration(_))));

        let mut config = Config::default();
        config.coverage.keyword_match_ratio = 1.5;
        let err = DesignEngine::new(&config, ConstraintRegistry::default(), SessionStore::new()).err();
        assert!(matches!(err, Some(EngineError::Configuration(_))));

        let mut config = Config::default();
        config.pivot.trend_window = 1;
        let err = DesignEngine::new(&config, ConstraintRegistry::default(), SessionStore::new()).err();
        assert!(matches!(err, Some(EngineError::Configuration(_))));

        let mut config = Config::default();
        config.workflow.coverage_threshold = 101.0;
        let err = DesignEngine::new(&config, ConstraintRegistry::default(), SessionStore::new()).err();
        assert!(matches!(err, Some(EngineError::Configuration(_))));
    }

    #[test]
    fn test_constraint_with_unknown_phase_rejected() {
        let mut engine = engine();
        let typo = json!([
            {"id": "a", "description": "Encrypt data", "mandatory": true, "phases": ["architecure"]}
        ]);
        let err = engine.start(config("s1"), Some(typo.clone())).unwrap_err();
        assert!(err.to_string().contains("unknown phase 'architecure'"));
        assert!(engine.status("s1").is_err());

        assert!(matches!(engine.load_constraints(typo), Err(EngineError::Configuration(_))));
        assert!(engine.registry().is_empty());

        let ok = json!([{"id": "a", "description": "Encrypt data", "phases": ["Architecture"]}]);
        assert!(engine.start(config("s1"), Some(ok)).is_ok());
    }

    #[test]
    fn test_builtin_constraints_fit_custom_phases() {
        let mut settings = Config::default();
        settings.workflow.phases = vec!["explore".to_string(), "build".to_string()];
        let registry = ConstraintRegistry::builtin().unwrap();
        let mut engine = DesignEngine::new(&settings, registry, SessionStore::new()).unwrap();
        let started = engine.start(config("s1"), None).unwrap();
        assert_eq!(started.current_phase, "explore");
    }

    #[test]
    fn test_methodology_selection_generates_adr() {
        let mut engine = engine();
        let mut cfg = config("s1");
        cfg.signals = Some(ProjectSignals::parse(
            Some("greenfield"),
            Some("exploratory"),
            Some("small"),
            Some("flexible"),
            Some("high"),
        ));
        let response = engine.start(cfg, None).unwrap();
        let selection = response.methodology.unwrap();
        assert_eq!(selection.methodology, Methodology::LightweightIterative);
        assert_eq!(response.artifacts.len(), 1);
        assert_eq!(response.artifacts[0].artifact_type, ArtifactType::Adr);

        let session = engine.session("s1").unwrap();
        assert_eq!(
            session.config.metadata.get(METHODOLOGY_METADATA_KEY).map(String::as_str),
            Some("lightweight-iterative")
        );
    }

    #[test]
    fn test_load_constraints_is_all_or_nothing() {
        let mut engine = engine();
        let summary = engine
            .load_constraints(json!([
                {"id": "a", "category": "security", "description": "Encrypt data", "mandatory": true},
                {"id": "b", "category": "ops", "description": "Document runbooks"}
            ]))
            .unwrap();
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.mandatory, 1);
        assert_eq!(summary.categories, vec!["ops".to_string(), "security".to_string()]);

        let err = engine
            .load_constraints(json!([{"id": "c", "description": "ok"}, {"id": "", "description": "bad"}]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        assert_eq!(engine.registry().len(), 2);
    }

    #[test]
    fn test_close_and_list_active() {
        let mut engine = engine();
        engine.start(config("s1"), None).unwrap();
        engine.start(config("s2"), None).unwrap();
        assert_eq!(engine.list_active(), vec!["s1".to_string(), "s2".to_string()]);

        let closed = engine.close("s1", "project cancelled").unwrap();
        assert_eq!(closed.status, SessionStatus::Failed);
        assert_eq!(engine.list_active(), vec!["s2".to_string()]);
        assert!(engine.close("s1", "again").is_err());
        assert!(engine.advance("s1", &PhaseSubmission::new("x")).is_err());
    }

    #[test]
    fn test_generate_empty_types_is_bundle() {
        let mut engine = engine();
        engine.start(config("s1"), None).unwrap();
        let response = engine.generate_artifacts("s1", &[]).unwrap();
        // Specification fails without requirements or validated content
        assert_eq!(response.artifacts.len(), 2);
        assert_eq!(response.warnings.len(), 2);
        assert_eq!(engine.session("s1").unwrap().artifacts.len(), 2);
    }

    #[test]
    fn test_evaluate_pivot_records_history() {
        let mut engine = engine();
        engine.start(config("s1"), None).unwrap();
        let response = engine.evaluate_pivot("s1", "all good").unwrap();
        assert!(!response.decision.recommend_pivot);
        let session = engine.session("s1").unwrap();
        assert_eq!(session.history.last().map(|h| h.event.name()), Some("pivot-evaluated"));
    }

    #[test]
    fn test_rollback_and_skip() {
        let mut engine = engine();
        engine.start(config("s1"), None).unwrap();
        let skipped = engine.skip("s1", "done elsewhere").unwrap();
        assert!(skipped.success);
        assert_eq!(skipped.current_phase, "requirements");

        let rolled = engine.rollback("s1", "discovery", "need stakeholder input").unwrap();
        assert_eq!(rolled.current_phase, "discovery");
        let session = engine.session("s1").unwrap();
        assert_eq!(session.phase_status("discovery"), PhaseStatus::InProgress);
    }

    #[test]
    fn test_not_found_everywhere() {
        let mut engine = engine();
        let submission = PhaseSubmission::new("x");
        assert!(matches!(engine.status("ghost"), Err(EngineError::NotFound(_))));
        assert!(matches!(engine.advance("ghost", &submission), Err(EngineError::NotFound(_))));
        assert!(matches!(
            engine.validate("ghost", "discovery", &submission),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(engine.evaluate_pivot("ghost", "x"), Err(EngineError::NotFound(_))));
        assert!(matches!(
            engine.generate_artifacts("ghost", &[ArtifactType::Adr]),
            Err(EngineError::NotFound(_))
        ));
    }
}
