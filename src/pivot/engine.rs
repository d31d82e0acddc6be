//! PivotEngine - continue/pivot recommendation
//!
//! Indicators come from three places: blocked advances on the current phase,
//! complexity/uncertainty/risk phrases in the supplied content (see the
//! signal rule table), and a coverage trend that keeps falling across the
//! most recent advance attempts. Their weights are summed and compared with
//! the configured threshold. Evaluation never mutates the session.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PivotConfig;
use crate::coverage::rules::{NormalizedText, Signal, scan};
use crate::domain::Session;

/// Weight of each blocked advance once the failure limit is reached
const FAILURE_WEIGHT: f64 = 1.0;
/// Weight of a declining coverage trend
const TREND_WEIGHT: f64 = 1.5;

/// How urgent a pivot is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Source of an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndicatorKind {
    RepeatedFailures,
    Complexity,
    Uncertainty,
    Risk,
    DecliningCoverage,
}

/// One reason to consider pivoting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotIndicator {
    pub kind: IndicatorKind,
    pub weight: f64,
    pub detail: String,
}

/// Continue/pivot recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotDecision {
    pub recommend_pivot: bool,
    pub severity: Severity,
    /// 0.0 to 1.0
    pub confidence: f64,
    pub indicators: Vec<PivotIndicator>,
    pub rationale: String,
    /// Earlier phase worth rolling back to, when pivoting
    pub rollback_target: Option<String>,
}

impl PivotDecision {
    /// The fixed answer for sessions with pivots disabled
    pub fn disabled() -> Self {
        Self {
            recommend_pivot: false,
            severity: Severity::None,
            confidence: 1.0,
            indicators: Vec::new(),
            rationale: "Continue: pivot evaluation is disabled for this session".to_string(),
            rollback_target: None,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.indicators.iter().map(|i| i.weight).sum()
    }
}

/// Evaluates whether a session should change direction
#[derive(Debug, Clone, Default)]
pub struct PivotEngine {
    config: PivotConfig,
}

impl PivotEngine {
    pub fn new(config: PivotConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, session: &Session, content: &str) -> PivotDecision {
        debug!(session_id = %session.id, content_len = content.len(), "PivotEngine::evaluate: called");

        if !session.config.enable_pivots {
            debug!("evaluate: pivots disabled branch");
            return PivotDecision::disabled();
        }

        let mut indicators = Vec::new();
        indicators.extend(self.failure_indicator(session));
        indicators.extend(self.keyword_indicators(content));
        indicators.extend(self.trend_indicator(session));

        let total: f64 = indicators.iter().map(|i| i.weight).sum();
        let threshold = self.config.threshold;
        let recommend_pivot = total >= threshold;

        let severity = if total == 0.0 {
            Severity::None
        } else if !recommend_pivot {
            Severity::Low
        } else if total >= threshold * 2.0 {
            Severity::High
        } else {
            Severity::Medium
        };

        // Distance from the threshold, mapped onto 0.5..=1.0
        let confidence = if recommend_pivot {
            0.5 + 0.5 * ((total - threshold) / threshold).min(1.0)
        } else {
            1.0 - 0.5 * (total / threshold)
        };

        let details: Vec<&str> = indicators.iter().map(|i| i.detail.as_str()).collect();
        let rationale = if recommend_pivot {
            format!(
                "Pivot recommended (indicator weight {:.1} >= {:.1}): {}",
                total,
                threshold,
                details.join("; ")
            )
        } else if indicators.is_empty() {
            "Continue: no pivot indicators found".to_string()
        } else {
            format!(
                "Continue (indicator weight {:.1} < {:.1}): {}",
                total,
                threshold,
                details.join("; ")
            )
        };

        let rollback_target = if recommend_pivot {
            session
                .phases
                .position(&session.current_phase)
                .and_then(|pos| pos.checked_sub(1))
                .and_then(|prev| session.phases.as_slice().get(prev).cloned())
        } else {
            None
        };

        info!(
            session_id = %session.id,
            recommend_pivot,
            %severity,
            total,
            indicators = indicators.len(),
            "Pivot evaluated"
        );

        PivotDecision {
            recommend_pivot,
            severity,
            confidence: confidence.clamp(0.0, 1.0),
            indicators,
            rationale,
            rollback_target,
        }
    }

    fn failure_indicator(&self, session: &Session) -> Option<PivotIndicator> {
        let failures = session.blocked_count(&session.current_phase);
        if failures < self.config.failure_limit {
            return None;
        }
        Some(PivotIndicator {
            kind: IndicatorKind::RepeatedFailures,
            weight: failures as f64 * FAILURE_WEIGHT,
            detail: format!(
                "{} blocked advances on the {} phase",
                failures, session.current_phase
            ),
        })
    }

    fn keyword_indicators(&self, content: &str) -> Vec<PivotIndicator> {
        let scan = scan(&NormalizedText::new(content));
        let by_signal = scan.phrases_by_signal();
        [
            (Signal::Complexity, IndicatorKind::Complexity),
            (Signal::Uncertainty, IndicatorKind::Uncertainty),
            (Signal::Risk, IndicatorKind::Risk),
        ]
        .into_iter()
        .filter_map(|(signal, kind)| {
            let weight = scan.weight(signal);
            if weight == 0.0 {
                return None;
            }
            let phrases = by_signal.get(&signal).map(|p| p.join(", ")).unwrap_or_default();
            Some(PivotIndicator {
                kind,
                weight,
                detail: format!("{} signals: {}", signal, phrases),
            })
        })
        .collect()
    }

    fn trend_indicator(&self, session: &Session) -> Option<PivotIndicator> {
        let scores = session.score_trend();
        let window = self.config.trend_window;
        if window < 2 || scores.len() < window {
            return None;
        }
        let recent = &scores[scores.len() - window..];
        let declining = recent.windows(2).all(|w| w[1] < w[0]);
        if !declining {
            return None;
        }
        Some(PivotIndicator {
            kind: IndicatorKind::DecliningCoverage,
            weight: TREND_WEIGHT,
            detail: format!(
                "coverage fell across the last {} attempts ({:.1}% to {:.1}%)",
                window,
                recent[0],
                recent[window - 1]
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintRegistry;
    use crate::domain::{HistoryEvent, PhaseSequence, SessionConfig};

    fn session(enable_pivots: bool) -> Session {
        let mut config = SessionConfig::new("Migrate the order system");
        config.enable_pivots = enable_pivots;
        let registry = ConstraintRegistry::from_constraints(vec![]).unwrap();
        let mut s = Session::new("s1", config, PhaseSequence::default(), 80.0, registry);
        s.current_phase = "architecture".to_string();
        s
    }

    fn blocked(s: &mut Session, phase: &str, coverage: f64) {
        s.record(
            HistoryEvent::AdvanceBlocked {
                phase: phase.to_string(),
                coverage,
                reasons: vec![],
            },
            "blocked",
        );
    }

    #[test]
    fn test_disabled_always_continues() {
        let s = session(false);
        let decision = PivotEngine::default().evaluate(
            &s,
            "This is complex, unclear, risky, a blocker, a legacy rewrite with unknowns",
        );
        assert_eq!(decision, PivotDecision::disabled());
        assert!(!decision.recommend_pivot);
    }

    #[test]
    fn test_calm_content_continues() {
        let s = session(true);
        let decision = PivotEngine::default().evaluate(&s, "The API returns paginated results");
        assert!(!decision.recommend_pivot);
        assert_eq!(decision.severity, Severity::None);
        assert!(decision.indicators.is_empty());
        assert_eq!(decision.confidence, 1.0);
    }

    #[test]
    fn test_keyword_indicators_trigger_pivot() {
        let s = session(true);
        let decision = PivotEngine::default().evaluate(
            &s,
            "The legacy migration is complex and the data model is unclear. Vendor lock-in is a major risk.",
        );
        assert!(decision.recommend_pivot);
        assert!(decision.severity >= Severity::Medium);
        assert!(decision.rationale.starts_with("Pivot recommended"));
        assert_eq!(decision.rollback_target.as_deref(), Some("requirements"));
        let kinds: Vec<_> = decision.indicators.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IndicatorKind::Complexity));
        assert!(kinds.contains(&IndicatorKind::Uncertainty));
        assert!(kinds.contains(&IndicatorKind::Risk));
    }

    #[test]
    fn test_repeated_failures_and_declining_trend() {
        let mut s = session(true);
        blocked(&mut s, "architecture", 60.0);
        blocked(&mut s, "architecture", 50.0);
        blocked(&mut s, "architecture", 40.0);

        let decision = PivotEngine::default().evaluate(&s, "Nothing alarming here");
        let kinds: Vec<_> = decision.indicators.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IndicatorKind::RepeatedFailures, IndicatorKind::DecliningCoverage]);
        // 3 failures + trend = 4.5
        assert_eq!(decision.total_weight(), 4.5);
        assert!(decision.recommend_pivot);
        assert_eq!(decision.severity, Severity::Medium);
    }

    #[test]
    fn test_single_failure_below_limit() {
        let mut s = session(true);
        blocked(&mut s, "architecture", 60.0);
        blocked(&mut s, "discovery", 10.0);

        let decision = PivotEngine::default().evaluate(&s, "");
        assert!(decision.indicators.is_empty());
        assert!(!decision.recommend_pivot);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let s = session(true);
        let before = s.history.len();
        let engine = PivotEngine::default();
        let a = engine.evaluate(&s, "unclear and risky");
        let b = engine.evaluate(&s, "unclear and risky");
        assert_eq!(a, b);
        assert_eq!(s.history.len(), before);
    }
}
