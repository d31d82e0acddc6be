//! CoverageCalculator - scores a phase submission
//!
//! Dimensions and fixed weights:
//!
//! | dimension     | weight |
//! |---------------|--------|
//! | requirements  | 40%    |
//! | constraints   | 30%    |
//! | documentation | 20%    |
//! | testing       | 10%    |
//!
//! Every score is clamped to `[0, 100]`, and identical inputs always produce
//! identical reports.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rules::{NormalizedText, Signal, scan, statement_covered};
use crate::config::CoverageConfig;
use crate::constraints::Constraint;

pub const REQUIREMENTS_WEIGHT: f64 = 0.40;
pub const CONSTRAINTS_WEIGHT: f64 = 0.30;
pub const DOCUMENTATION_WEIGHT: f64 = 0.20;
pub const TESTING_WEIGHT: f64 = 0.10;

/// Documentation points available from headings (6 each, up to 5 headings)
const HEADING_POINTS: f64 = 6.0;
const MAX_HEADINGS: usize = 5;
/// Documentation points available from bullets (2 each, up to 10 bullets)
const BULLET_POINTS: f64 = 2.0;
const MAX_BULLETS: usize = 10;
/// Documentation points available from length
const LENGTH_POINTS: f64 = 50.0;

/// Explicit evidence that a phase is tested
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestEvidence {
    pub passed: u32,
    pub total: u32,
    /// Line/branch coverage percentage, if measured
    pub line_coverage: Option<f64>,
}

impl TestEvidence {
    /// Testing score from the evidence; line coverage wins when present
    pub fn score(&self) -> f64 {
        if let Some(pct) = self.line_coverage {
            return clamp(pct);
        }
        if self.total == 0 {
            return 0.0;
        }
        clamp(self.passed.min(self.total) as f64 / self.total as f64 * 100.0)
    }
}

/// Content submitted for a phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseSubmission {
    pub content: String,
    /// Constraint ids the author explicitly claims to have addressed
    pub satisfied_constraints: Vec<String>,
    pub test_evidence: Option<TestEvidence>,
}

impl PhaseSubmission {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_satisfied(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.satisfied_constraints.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_test_evidence(mut self, evidence: TestEvidence) -> Self {
        self.test_evidence = Some(evidence);
        self
    }
}

/// Scores for one phase submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub phase: String,
    pub overall: f64,
    pub requirements: f64,
    pub constraints: f64,
    pub documentation: f64,
    pub testing: f64,
    /// Requirements with no keyword coverage in the content
    pub missing_requirements: Vec<String>,
    /// Ids of mandatory constraints for the phase that are satisfied
    pub satisfied_constraints: Vec<String>,
    /// Ids of mandatory constraints for the phase that are not satisfied
    pub unsatisfied_constraints: Vec<String>,
}

impl CoverageReport {
    /// A report with every dimension at zero
    pub fn empty(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            ..Default::default()
        }
    }

    pub fn meets(&self, threshold: f64) -> bool {
        self.overall >= threshold
    }
}

/// Weighted aggregate of the four dimensions
pub fn weighted_overall(requirements: f64, constraints: f64, documentation: f64, testing: f64) -> f64 {
    clamp(
        requirements * REQUIREMENTS_WEIGHT
            + constraints * CONSTRAINTS_WEIGHT
            + documentation * DOCUMENTATION_WEIGHT
            + testing * TESTING_WEIGHT,
    )
}

/// Clamp to [0, 100] and round to two decimals
pub fn clamp(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    (score.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

/// Scores phase submissions
#[derive(Debug, Clone)]
pub struct CoverageCalculator {
    config: CoverageConfig,
}

impl Default for CoverageCalculator {
    fn default() -> Self {
        Self::new(CoverageConfig::default())
    }
}

impl CoverageCalculator {
    pub fn new(config: CoverageConfig) -> Self {
        Self { config }
    }

    /// Score a submission against the constraints and requirements of a phase
    ///
    /// `constraints` may contain optional constraints; only mandatory ones
    /// count toward the constraints dimension. Empty content scores zero on
    /// every dimension.
    pub fn score(
        &self,
        phase: &str,
        submission: &PhaseSubmission,
        constraints: &[&Constraint],
        requirements: &[String],
    ) -> CoverageReport {
        debug!(
            %phase,
            content_len = submission.content.len(),
            constraint_count = constraints.len(),
            requirement_count = requirements.len(),
            "CoverageCalculator::score: called"
        );

        let text = NormalizedText::new(&submission.content);
        let mandatory: Vec<&Constraint> = constraints.iter().copied().filter(|c| c.mandatory).collect();

        if text.is_empty() {
            debug!("score: empty content branch");
            let mut report = CoverageReport::empty(phase);
            report.missing_requirements = requirements.to_vec();
            report.unsatisfied_constraints = mandatory.iter().map(|c| c.id.clone()).collect();
            return report;
        }

        let (requirements_score, missing_requirements) = self.requirements_score(&text, requirements);
        let (constraints_score, satisfied, unsatisfied) = self.constraints_score(&text, submission, &mandatory);
        let documentation = self.documentation_score(&submission.content, &text);
        let testing = submission.test_evidence.as_ref().map(TestEvidence::score).unwrap_or(0.0);

        let report = CoverageReport {
            phase: phase.to_string(),
            overall: weighted_overall(requirements_score, constraints_score, documentation, testing),
            requirements: requirements_score,
            constraints: constraints_score,
            documentation,
            testing,
            missing_requirements,
            satisfied_constraints: satisfied,
            unsatisfied_constraints: unsatisfied,
        };
        debug!(overall = report.overall, "score: complete");
        report
    }

    fn requirements_score(&self, text: &NormalizedText, requirements: &[String]) -> (f64, Vec<String>) {
        if requirements.is_empty() {
            debug!("requirements_score: no requirements branch");
            return (100.0, Vec::new());
        }
        let missing: Vec<String> = requirements
            .iter()
            .filter(|r| !statement_covered(text, r, self.config.keyword_match_ratio))
            .cloned()
            .collect();
        let covered = requirements.len() - missing.len();
        (clamp(covered as f64 / requirements.len() as f64 * 100.0), missing)
    }

    fn constraints_score(
        &self,
        text: &NormalizedText,
        submission: &PhaseSubmission,
        mandatory: &[&Constraint],
    ) -> (f64, Vec<String>, Vec<String>) {
        if mandatory.is_empty() {
            debug!("constraints_score: no mandatory constraints branch");
            return (100.0, Vec::new(), Vec::new());
        }
        let acknowledged: HashSet<&str> = submission.satisfied_constraints.iter().map(|s| s.trim()).collect();

        let mut satisfied = Vec::new();
        let mut unsatisfied = Vec::new();
        for constraint in mandatory {
            if acknowledged.contains(constraint.id.as_str()) || self.keywords_present(text, constraint) {
                satisfied.push(constraint.id.clone());
            } else {
                unsatisfied.push(constraint.id.clone());
            }
        }
        let score = clamp(satisfied.len() as f64 / mandatory.len() as f64 * 100.0);
        (score, satisfied, unsatisfied)
    }

    fn keywords_present(&self, text: &NormalizedText, constraint: &Constraint) -> bool {
        let kws = constraint.match_keywords();
        if kws.is_empty() {
            return false;
        }
        let hits = kws.iter().filter(|k| text.has_keyword(k)).count();
        hits as f64 / kws.len() as f64 >= self.config.keyword_match_ratio
    }

    /// Density estimate from length and structure markers
    fn documentation_score(&self, content: &str, text: &NormalizedText) -> f64 {
        let mut headings = 0usize;
        let mut bullets = 0usize;
        for line in content.lines().map(str::trim_start) {
            if line.starts_with('#') {
                headings += 1;
            } else if is_bullet(line) {
                bullets += 1;
            }
        }

        let target = self.config.word_target.max(1) as f64;
        let length = (text.word_count() as f64 / target).min(1.0) * LENGTH_POINTS;
        let structure = headings.min(MAX_HEADINGS) as f64 * HEADING_POINTS + bullets.min(MAX_BULLETS) as f64 * BULLET_POINTS;
        debug!(headings, bullets, words = text.word_count(), "documentation_score: computed");
        clamp(length + structure)
    }

    /// Percentage of assumption statements backed by evidence across texts
    ///
    /// Lines that state an assumption count as backed when the same line also
    /// carries an evidence signal. No assumptions at all scores 100.
    pub fn assumptions_score<'a>(&self, contents: impl IntoIterator<Item = &'a str>) -> f64 {
        let mut stated = 0usize;
        let mut backed = 0usize;
        for content in contents {
            for line in content.lines() {
                let signals = scan(&NormalizedText::new(line));
                if signals.count(Signal::Assumption) > 0 {
                    stated += 1;
                    if signals.count(Signal::Evidence) > 0 {
                        backed += 1;
                    }
                }
            }
        }
        if stated == 0 {
            return 100.0;
        }
        clamp(backed as f64 / stated as f64 * 100.0)
    }
}

fn is_bullet(line: &str) -> bool {
    if line.starts_with("- ") || line.starts_with("* ") || line.starts_with("+ ") {
        return true;
    }
    // Numbered list items: "1. " or "1) "
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && (line[digits..].starts_with(". ") || line[digits..].starts_with(") "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(id: &str, description: &str, mandatory: bool) -> Constraint {
        Constraint {
            id: id.to_string(),
            category: "general".to_string(),
            description: description.to_string(),
            mandatory,
            phases: vec![],
            keywords: vec![],
        }
    }

    fn reqs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_content_scores_zero() {
        let calc = CoverageCalculator::default();
        let c = constraint("c1", "Encrypt customer data", true);
        let report = calc.score(
            "discovery",
            &PhaseSubmission::new("   \n  "),
            &[&c],
            &reqs(&["Support OAuth login"]),
        );
        assert_eq!(report.overall, 0.0);
        assert_eq!(report.requirements, 0.0);
        assert_eq!(report.constraints, 0.0);
        assert_eq!(report.documentation, 0.0);
        assert_eq!(report.testing, 0.0);
        assert_eq!(report.unsatisfied_constraints, vec!["c1".to_string()]);
        assert_eq!(report.missing_requirements.len(), 1);
    }

    #[test]
    fn test_requirements_ratio() {
        let calc = CoverageCalculator::default();
        let requirements = reqs(&[
            "Support OAuth login",
            "Export invoices as PDF",
            "Send weekly digest emails",
            "Audit every admin action",
            "Offline mobile mode",
        ]);
        let content = "Users sign in through OAuth login. Invoices export to PDF files.";
        let report = calc.score("requirements", &PhaseSubmission::new(content), &[], &requirements);
        assert_eq!(report.requirements, 40.0);
        assert_eq!(report.missing_requirements.len(), 3);
        // No mandatory constraints means full constraint coverage
        assert_eq!(report.constraints, 100.0);
    }

    #[test]
    fn test_short_and_non_latin_requirements() {
        let calc = CoverageCalculator::default();
        let requirements = reqs(&["UI", "決済処理"]);

        let content = "# UI\nThe UI is done. 決済処理 is implemented.";
        let report = calc.score("requirements", &PhaseSubmission::new(content), &[], &requirements);
        assert_eq!(report.requirements, 100.0);
        assert!(report.missing_requirements.is_empty());

        let report = calc.score(
            "requirements",
            &PhaseSubmission::new("## 決済処理\n- カード決済を実装した"),
            &[],
            &requirements,
        );
        assert_eq!(report.requirements, 50.0);
        assert_eq!(report.missing_requirements, vec!["UI".to_string()]);
        assert!(report.documentation > 0.0);
        assert!(report.overall > 0.0);
    }

    #[test]
    fn test_constraints_by_keyword_or_acknowledgement() {
        let calc = CoverageCalculator::default();
        let c1 = constraint("c1", "Encrypt customer data", true);
        let c2 = constraint("c2", "Rate limit public endpoints", true);
        let optional = constraint("c3", "Nice dashboards", false);

        let submission = PhaseSubmission::new("All customer data is encrypted at rest.");
        let report = calc.score("architecture", &submission, &[&c1, &c2, &optional], &[]);
        assert_eq!(report.constraints, 50.0);
        assert_eq!(report.satisfied_constraints, vec!["c1".to_string()]);
        assert_eq!(report.unsatisfied_constraints, vec!["c2".to_string()]);

        let submission = submission.with_satisfied(["c2"]);
        let report = calc.score("architecture", &submission, &[&c1, &c2, &optional], &[]);
        assert_eq!(report.constraints, 100.0);
        assert!(report.unsatisfied_constraints.is_empty());
    }

    #[test]
    fn test_documentation_structure() {
        let calc = CoverageCalculator::default();
        let flat = calc.score("discovery", &PhaseSubmission::new("short note"), &[], &[]);
        let structured = calc.score(
            "discovery",
            &PhaseSubmission::new("# Context\nshort note\n## Goals\n- one\n- two\n1. first\n2) second"),
            &[],
            &[],
        );
        assert!(structured.documentation > flat.documentation);
        assert!(structured.documentation <= 100.0);
    }

    #[test]
    fn test_documentation_caps_at_100() {
        let calc = CoverageCalculator::default();
        let mut content = String::new();
        for i in 0..20 {
            content.push_str(&format!("# Heading {}\n", i));
            content.push_str(&"- bullet with several words of prose\n".repeat(3));
        }
        content.push_str(&"word ".repeat(2000));
        let report = calc.score("discovery", &PhaseSubmission::new(content), &[], &[]);
        assert_eq!(report.documentation, 100.0);
    }

    #[test]
    fn test_testing_requires_explicit_evidence() {
        let calc = CoverageCalculator::default();
        let content = "All tests pass and everything is tested thoroughly";
        let report = calc.score("validation", &PhaseSubmission::new(content), &[], &[]);
        assert_eq!(report.testing, 0.0);

        let evidence = TestEvidence {
            passed: 9,
            total: 10,
            line_coverage: None,
        };
        let report = calc.score(
            "validation",
            &PhaseSubmission::new(content).with_test_evidence(evidence),
            &[],
            &[],
        );
        assert_eq!(report.testing, 90.0);
    }

    #[test]
    fn test_evidence_score_prefers_line_coverage() {
        let evidence = TestEvidence {
            passed: 1,
            total: 10,
            line_coverage: Some(140.0),
        };
        assert_eq!(evidence.score(), 100.0);
        assert_eq!(TestEvidence::default().score(), 0.0);
        let over = TestEvidence {
            passed: 12,
            total: 10,
            line_coverage: None,
        };
        assert_eq!(over.score(), 100.0);
    }

    #[test]
    fn test_overall_is_weighted_aggregate() {
        let calc = CoverageCalculator::default();
        let c1 = constraint("c1", "Encrypt customer data", true);
        let submission = PhaseSubmission::new("# Security\n- encrypt customer data\nOAuth login supported")
            .with_test_evidence(TestEvidence {
                passed: 1,
                total: 2,
                line_coverage: None,
            });
        let report = calc.score("architecture", &submission, &[&c1], &reqs(&["OAuth login"]));
        let expected = weighted_overall(report.requirements, report.constraints, report.documentation, report.testing);
        assert_eq!(report.overall, expected);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total = REQUIREMENTS_WEIGHT + CONSTRAINTS_WEIGHT + DOCUMENTATION_WEIGHT + TESTING_WEIGHT;
        assert!((total - 1.0).abs() < f64::EPSILON);
        assert_eq!(weighted_overall(100.0, 100.0, 100.0, 100.0), 100.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-5.0), 0.0);
        assert_eq!(clamp(150.0), 100.0);
        assert_eq!(clamp(f64::NAN), 0.0);
        assert_eq!(clamp(33.333333), 33.33);
    }

    #[test]
    fn test_assumptions_score() {
        let calc = CoverageCalculator::default();
        assert_eq!(calc.assumptions_score(["no hedging here"]), 100.0);
        assert_eq!(
            calc.assumptions_score([
                "We assume 1k rps, validated by load test",
                "We assume users have modern browsers"
            ]),
            50.0
        );
    }

    #[test]
    fn test_is_bullet() {
        assert!(is_bullet("- item"));
        assert!(is_bullet("12. item"));
        assert!(is_bullet("3) item"));
        assert!(!is_bullet("-item"));
        assert!(!is_bullet("2024 was a year"));
    }
}
