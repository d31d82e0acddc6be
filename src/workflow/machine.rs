//! PhaseWorkflow - gated movement of a session through its phases
//!
//! A phase is validated only when the submission reaches the session's
//! coverage threshold and every mandatory constraint for the phase is
//! satisfied. Anything else leaves the pointer where it is and marks the
//! session blocked. The pointer only moves backward through `rollback`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::coverage::{CoverageCalculator, CoverageReport, PhaseSubmission};
use crate::domain::{HistoryEvent, PhaseStatus, Session, SessionStatus};
use crate::error::{EngineError, EngineResult};

/// Documentation score under which an expansion is recommended
const THIN_DOCUMENTATION: f64 = 50.0;

/// Result of an advance or skip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceOutcome {
    /// Whether the phase was validated (or skipped) and the pointer moved
    pub advanced: bool,
    /// Phase the submission was for
    pub phase: String,
    /// Current phase after the operation
    pub current_phase: String,
    pub status: SessionStatus,
    pub report: CoverageReport,
    /// Why the advance was refused; empty on success
    pub reasons: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AdvanceOutcome {
    /// Refusal reasons joined into one message, if any
    pub fn failure_reason(&self) -> Option<String> {
        if self.reasons.is_empty() {
            None
        } else {
            Some(self.reasons.join("; "))
        }
    }
}

/// Drives sessions through their phase sequence
#[derive(Debug, Clone, Default)]
pub struct PhaseWorkflow {
    calculator: CoverageCalculator,
}

impl PhaseWorkflow {
    pub fn new(calculator: CoverageCalculator) -> Self {
        Self { calculator }
    }

    pub fn calculator(&self) -> &CoverageCalculator {
        &self.calculator
    }

    /// Score a submission for a phase of the session
    fn score(&self, session: &Session, phase: &str, submission: &PhaseSubmission) -> CoverageReport {
        let constraints = session.constraints.constraints_for(phase);
        self.calculator
            .score(phase, submission, &constraints, &session.config.requirements)
    }

    /// Score a submission and advance if the gate is met
    pub fn advance(&self, session: &mut Session, submission: &PhaseSubmission) -> EngineResult<AdvanceOutcome> {
        debug!(session_id = %session.id, phase = %session.current_phase, "PhaseWorkflow::advance: called");
        ensure_open(session, "advance")?;

        let phase = session.current_phase.clone();
        let report = self.score(session, &phase, submission);

        let satisfied: HashSet<String> = report.satisfied_constraints.iter().cloned().collect();
        let unsatisfied = session.constraints.mandatory_unsatisfied(&phase, &satisfied);

        let mut reasons = Vec::new();
        if !report.meets(session.threshold) {
            reasons.push(format!(
                "Coverage {:.1}% is below the required {:.1}%",
                report.overall, session.threshold
            ));
        }
        for constraint in &unsatisfied {
            reasons.push(format!(
                "Mandatory constraint '{}' is not satisfied: {}",
                constraint.id, constraint.description
            ));
        }

        let mut recommendations = remediation(&report);
        for constraint in &unsatisfied {
            recommendations.push(format!(
                "Address missing mandatory constraint {}: {}",
                constraint.id, constraint.description
            ));
        }

        if !reasons.is_empty() {
            warn!(
                session_id = %session.id,
                %phase,
                coverage = report.overall,
                reasons = reasons.len(),
                "Advance blocked"
            );
            session
                .phase_record_mut(&phase)
                .record_submission(&submission.content, report.overall, PhaseStatus::InProgress);
            session.set_status(SessionStatus::Blocked);
            session.record(
                HistoryEvent::AdvanceBlocked {
                    phase: phase.clone(),
                    coverage: report.overall,
                    reasons: reasons.clone(),
                },
                format!("Advance from '{}' blocked at {:.1}% coverage", phase, report.overall),
            );
            session.last_report = Some(report.clone());
            return Ok(AdvanceOutcome {
                advanced: false,
                phase: phase.clone(),
                current_phase: phase,
                status: session.status,
                report,
                reasons,
                recommendations,
            });
        }

        session
            .phase_record_mut(&phase)
            .record_submission(&submission.content, report.overall, PhaseStatus::Validated);
        session.record(
            HistoryEvent::PhaseValidated {
                phase: phase.clone(),
                coverage: report.overall,
            },
            format!("Phase '{}' validated at {:.1}% coverage", phase, report.overall),
        );
        session.last_report = Some(report.clone());
        let recommendations = self.move_forward(session, &phase);

        Ok(AdvanceOutcome {
            advanced: true,
            phase,
            current_phase: session.current_phase.clone(),
            status: session.status,
            report,
            reasons: Vec::new(),
            recommendations,
        })
    }

    /// Score a submission without touching the session
    pub fn validate(&self, session: &Session, phase: &str, submission: &PhaseSubmission) -> EngineResult<CoverageReport> {
        debug!(session_id = %session.id, %phase, "PhaseWorkflow::validate: called");
        let phase = phase.trim().to_lowercase();
        if !session.phases.contains(&phase) {
            return Err(EngineError::InvalidTransition(format!(
                "phase '{}' is not part of session {}",
                phase, session.id
            )));
        }
        Ok(self.score(session, &phase, submission))
    }

    /// Move the pointer back to an earlier phase
    ///
    /// The target becomes `in-progress`; every later record resets to
    /// `not-started`.
    pub fn rollback(&self, session: &mut Session, target: &str, reason: &str) -> EngineResult<()> {
        debug!(session_id = %session.id, %target, "PhaseWorkflow::rollback: called");
        ensure_open(session, "roll back")?;

        let target = target.trim().to_lowercase();
        let target_pos = session.phases.position(&target).ok_or_else(|| {
            EngineError::InvalidTransition(format!("phase '{}' is not part of session {}", target, session.id))
        })?;
        let current_pos = session.phases.position(&session.current_phase).unwrap_or(0);
        if target_pos >= current_pos {
            return Err(EngineError::InvalidTransition(format!(
                "rollback target '{}' must precede the current phase '{}'",
                target, session.current_phase
            )));
        }

        let from = session.current_phase.clone();
        let reset = session.reset_after(&target);
        session.phase_record_mut(&target).set_status(PhaseStatus::InProgress);
        session.current_phase = target.clone();
        session.last_report = None;
        session.set_status(SessionStatus::Active);
        session.record(
            HistoryEvent::RolledBack {
                from: from.clone(),
                to: target.clone(),
            },
            format!("Rolled back from '{}' to '{}': {}", from, target, reason),
        );
        info!(session_id = %session.id, %from, to = %target, reset = reset.len(), "Rolled back");
        Ok(())
    }

    /// Mark the current phase skipped and move on
    ///
    /// Only allowed when no mandatory constraint applies to the phase.
    pub fn skip(&self, session: &mut Session, reason: &str) -> EngineResult<AdvanceOutcome> {
        debug!(session_id = %session.id, phase = %session.current_phase, "PhaseWorkflow::skip: called");
        ensure_open(session, "skip")?;

        let phase = session.current_phase.clone();
        let mandatory = session.constraints.mandatory_for(&phase);
        if !mandatory.is_empty() {
            let ids: Vec<&str> = mandatory.iter().map(|c| c.id.as_str()).collect();
            return Err(EngineError::InvalidTransition(format!(
                "phase '{}' has mandatory constraints ({}) and cannot be skipped",
                phase,
                ids.join(", ")
            )));
        }

        session.phase_record_mut(&phase).set_status(PhaseStatus::Skipped);
        session.record(
            HistoryEvent::PhaseSkipped { phase: phase.clone() },
            format!("Phase '{}' skipped: {}", phase, reason),
        );
        session.last_report = None;
        let recommendations = self.move_forward(session, &phase);

        Ok(AdvanceOutcome {
            advanced: true,
            phase: phase.clone(),
            current_phase: session.current_phase.clone(),
            status: session.status,
            report: CoverageReport::empty(phase),
            reasons: Vec::new(),
            recommendations,
        })
    }

    /// Point the session at the phase after `phase`, or complete it
    fn move_forward(&self, session: &mut Session, phase: &str) -> Vec<String> {
        match session.phases.next(phase).map(str::to_string) {
            Some(next) => {
                session.current_phase = next.clone();
                session.set_status(SessionStatus::Active);
                session.record(
                    HistoryEvent::PhaseAdvanced {
                        from: phase.to_string(),
                        to: next.clone(),
                    },
                    format!("Advanced from '{}' to '{}'", phase, next),
                );
                info!(session_id = %session.id, from = %phase, to = %next, "Phase advanced");
                vec![format!("Proceed with the {} phase", next)]
            }
            None => {
                session.set_status(SessionStatus::Completed);
                session.record(HistoryEvent::SessionCompleted, "All phases complete");
                info!(session_id = %session.id, "Session completed");
                vec!["Generate the final artifact bundle".to_string()]
            }
        }
    }
}

fn ensure_open(session: &Session, action: &str) -> EngineResult<()> {
    if session.status.is_terminal() {
        return Err(EngineError::InvalidTransition(format!(
            "cannot {} session {}: it is {}",
            action, session.id, session.status
        )));
    }
    Ok(())
}

/// Remediation hints derived from a coverage report
fn remediation(report: &CoverageReport) -> Vec<String> {
    let mut out: Vec<String> = report
        .missing_requirements
        .iter()
        .map(|r| format!("Cover requirement: {}", r))
        .collect();
    if report.documentation < THIN_DOCUMENTATION {
        out.push("Expand the documentation with headings and bullet points".to_string());
    }
    if report.testing == 0.0 {
        out.push("Add test evidence".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Constraint, ConstraintRegistry};
    use crate::domain::{PhaseSequence, SessionConfig};

    fn constraint(id: &str, description: &str, mandatory: bool, phases: &[&str]) -> Constraint {
        Constraint {
            id: id.to_string(),
            category: "general".to_string(),
            description: description.to_string(),
            mandatory,
            phases: phases.iter().map(|p| p.to_string()).collect(),
            keywords: vec![],
        }
    }

    fn session(threshold: f64, constraints: Vec<Constraint>, requirements: &[&str]) -> Session {
        let mut config = SessionConfig::new("Ship a payments API");
        config.requirements = requirements.iter().map(|r| r.to_string()).collect();
        let registry = ConstraintRegistry::from_constraints(constraints).unwrap();
        let phases = PhaseSequence::new(["discovery", "architecture", "validation"]).unwrap();
        let mut s = Session::new("s1", config, phases, threshold, registry);
        s.set_status(SessionStatus::Active);
        s
    }

    #[test]
    fn test_advance_moves_pointer_on_success() {
        let workflow = PhaseWorkflow::default();
        let mut s = session(0.0, vec![], &[]);

        let outcome = workflow.advance(&mut s, &PhaseSubmission::new("Stakeholders interviewed")).unwrap();
        assert!(outcome.advanced);
        assert_eq!(outcome.phase, "discovery");
        assert_eq!(s.current_phase, "architecture");
        assert_eq!(s.status, SessionStatus::Active);
        assert_eq!(s.phase_status("discovery"), PhaseStatus::Validated);
        assert!(outcome.failure_reason().is_none());
    }

    #[test]
    fn test_below_threshold_blocks() {
        let workflow = PhaseWorkflow::default();
        let mut s = session(85.0, vec![], &["Support OAuth login", "Export invoices as PDF"]);

        let outcome = workflow.advance(&mut s, &PhaseSubmission::new("OAuth login only")).unwrap();
        assert!(!outcome.advanced);
        assert_eq!(s.current_phase, "discovery");
        assert_eq!(s.status, SessionStatus::Blocked);
        assert_eq!(s.phase_status("discovery"), PhaseStatus::InProgress);
        assert!(outcome.failure_reason().unwrap().contains("below the required"));
        assert!(outcome.recommendations.iter().any(|r| r.contains("Export invoices")));
        assert!(outcome.recommendations.iter().any(|r| r == "Add test evidence"));
        assert_eq!(s.blocked_count("discovery"), 1);
    }

    #[test]
    fn test_mandatory_constraint_blocks_even_above_threshold() {
        let workflow = PhaseWorkflow::default();
        let c = constraint("sec", "Encrypt customer data", true, &["discovery"]);
        let mut s = session(0.0, vec![c], &[]);

        let outcome = workflow.advance(&mut s, &PhaseSubmission::new("Plenty of words here")).unwrap();
        assert!(!outcome.advanced);
        assert_eq!(s.current_phase, "discovery");
        assert!(outcome.reasons.iter().any(|r| r.contains("'sec'")));
        assert!(outcome.recommendations.iter().any(|r| r.contains("mandatory constraint sec")));

        let outcome = workflow
            .advance(&mut s, &PhaseSubmission::new("Plenty of words here").with_satisfied(["sec"]))
            .unwrap();
        assert!(outcome.advanced);
        assert_eq!(s.status, SessionStatus::Active);
    }

    #[test]
    fn test_last_phase_completes_session() {
        let workflow = PhaseWorkflow::default();
        let mut s = session(0.0, vec![], &[]);
        for _ in 0..3 {
            workflow.advance(&mut s, &PhaseSubmission::new("done")).unwrap();
        }
        assert_eq!(s.status, SessionStatus::Completed);
        assert_eq!(s.current_phase, "validation");

        let err = workflow.advance(&mut s, &PhaseSubmission::new("more")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
    }

    #[test]
    fn test_validate_has_no_side_effects() {
        let workflow = PhaseWorkflow::default();
        let s = session(85.0, vec![], &["Support OAuth login"]);
        let history_len = s.history.len();

        let report = workflow
            .validate(&s, "architecture", &PhaseSubmission::new("OAuth login"))
            .unwrap();
        assert_eq!(report.phase, "architecture");
        assert_eq!(s.history.len(), history_len);
        assert_eq!(s.status, SessionStatus::Active);
        assert!(s.phase_record("architecture").is_none());

        assert!(workflow.validate(&s, "deployment", &PhaseSubmission::new("x")).is_err());
    }

    #[test]
    fn test_last_report_tracks_advance_attempts() {
        let workflow = PhaseWorkflow::default();
        let mut s = session(0.0, vec![], &[]);
        assert!(s.last_report.is_none());

        workflow.advance(&mut s, &PhaseSubmission::new("Stakeholders interviewed")).unwrap();
        assert_eq!(s.current_phase, "architecture");
        assert_eq!(s.last_report.as_ref().map(|r| r.phase.as_str()), Some("discovery"));

        workflow
            .validate(&s, "architecture", &PhaseSubmission::new("Service boundaries"))
            .unwrap();
        assert_eq!(s.last_report.as_ref().map(|r| r.phase.as_str()), Some("discovery"));

        workflow.skip(&mut s, "covered by the platform team").unwrap();
        assert!(s.last_report.is_none());
    }

    #[test]
    fn test_rollback_resets_later_phases() {
        let workflow = PhaseWorkflow::default();
        let mut s = session(0.0, vec![], &[]);
        workflow.advance(&mut s, &PhaseSubmission::new("one")).unwrap();
        workflow.advance(&mut s, &PhaseSubmission::new("two")).unwrap();
        assert_eq!(s.current_phase, "validation");

        workflow.rollback(&mut s, "discovery", "assumptions invalidated").unwrap();
        assert_eq!(s.current_phase, "discovery");
        assert_eq!(s.phase_status("discovery"), PhaseStatus::InProgress);
        assert_eq!(s.phase_status("architecture"), PhaseStatus::NotStarted);
        assert!(matches!(
            s.history.last().map(|h| &h.event),
            Some(HistoryEvent::RolledBack { .. })
        ));
    }

    #[test]
    fn test_rollback_forward_rejected() {
        let workflow = PhaseWorkflow::default();
        let mut s = session(0.0, vec![], &[]);
        let err = workflow.rollback(&mut s, "validation", "why not").unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
        let err = workflow.rollback(&mut s, "discovery", "same phase").unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
        assert_eq!(s.current_phase, "discovery");
    }

    #[test]
    fn test_skip_requires_no_mandatory_constraints() {
        let workflow = PhaseWorkflow::default();
        let c = constraint("arch", "Record architecture decisions", true, &["architecture"]);
        let mut s = session(90.0, vec![c], &[]);

        let outcome = workflow.skip(&mut s, "already known").unwrap();
        assert!(outcome.advanced);
        assert_eq!(s.phase_status("discovery"), PhaseStatus::Skipped);
        assert_eq!(s.current_phase, "architecture");

        let err = workflow.skip(&mut s, "in a hurry").unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
        assert_eq!(s.current_phase, "architecture");
    }
}
