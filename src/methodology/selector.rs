//! Methodology rule table
//!
//! Rules are checked in order; the first rule whose every named signal
//! matches wins. A rule only looks at the signals it names, so narrower rules
//! further down can still match partial tuples. When nothing matches the
//! selector falls back to [`Methodology::Hybrid`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::signals::{ProblemFraming, ProjectSignals, ProjectType, RiskTolerance, TeamSize, Timeline};

/// Delivery methodology recommended for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Methodology {
    /// Short build-measure-learn loops, minimal up-front design
    LightweightIterative,
    /// Sequential, gated phases with sign-off (waterfall-leaning)
    Staged,
    /// Prototype the riskiest parts first, then commit
    RiskDriven,
    /// Ship thin vertical slices against a stable core
    Incremental,
    /// Iterative delivery inside staged milestones
    Hybrid,
}

impl Methodology {
    pub const ALL: [Methodology; 5] = [
        Self::LightweightIterative,
        Self::Staged,
        Self::RiskDriven,
        Self::Incremental,
        Self::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LightweightIterative => "lightweight-iterative",
            Self::Staged => "staged",
            Self::RiskDriven => "risk-driven",
            Self::Incremental => "incremental",
            Self::Hybrid => "hybrid",
        }
    }

    /// Practices the methodology commits the team to
    pub fn practices(&self) -> &'static [&'static str] {
        match self {
            Self::LightweightIterative => &[
                "Time-boxed iterations of one to two weeks",
                "Prototype before committing to architecture",
                "Revisit requirements at the end of every iteration",
            ],
            Self::Staged => &[
                "Formal sign-off at the end of each phase",
                "Complete specification before implementation starts",
                "Change control for requirement updates",
            ],
            Self::RiskDriven => &[
                "Spike the highest-risk components first",
                "Keep a ranked risk register",
                "Gate commitments on prototype evidence",
            ],
            Self::Incremental => &[
                "Deliver thin vertical slices",
                "Protect the existing core with regression tests",
                "Plan releases per slice rather than per phase",
            ],
            Self::Hybrid => &[
                "Staged milestones with iterative work inside each",
                "Lightweight decision records per milestone",
                "Re-plan at every milestone boundary",
            ],
        }
    }
}

impl std::fmt::Display for Methodology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Methodology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| format!("Unknown methodology: {}", s))
    }
}

/// One row of the methodology table; `None` fields are wildcards
#[derive(Debug, Clone, Copy)]
pub struct MethodologyRule {
    pub name: &'static str,
    pub project_type: Option<ProjectType>,
    pub problem_framing: Option<ProblemFraming>,
    pub team_size: Option<TeamSize>,
    pub timeline: Option<Timeline>,
    pub risk_tolerance: Option<RiskTolerance>,
    pub methodology: Methodology,
    pub rationale: &'static str,
}

impl MethodologyRule {
    /// A rule matches when every signal it names is present and equal
    pub fn matches(&self, signals: &ProjectSignals) -> bool {
        fn slot<T: PartialEq>(rule: Option<T>, actual: Option<T>) -> bool {
            match rule {
                Some(expected) => actual == Some(expected),
                None => true,
            }
        }
        slot(self.project_type, signals.project_type)
            && slot(self.problem_framing, signals.problem_framing)
            && slot(self.team_size, signals.team_size)
            && slot(self.timeline, signals.timeline)
            && slot(self.risk_tolerance, signals.risk_tolerance)
    }
}

/// The builtin table, most specific rows first
pub const METHODOLOGY_RULES: &[MethodologyRule] = &[
    MethodologyRule {
        name: "greenfield-exploratory-small-flexible",
        project_type: Some(ProjectType::Greenfield),
        problem_framing: Some(ProblemFraming::Exploratory),
        team_size: Some(TeamSize::Small),
        timeline: Some(Timeline::Flexible),
        risk_tolerance: Some(RiskTolerance::High),
        methodology: Methodology::LightweightIterative,
        rationale: "A small team exploring a new problem with time to spare and appetite for risk learns fastest in short iterations",
    },
    MethodologyRule {
        name: "brownfield-defined-large-fixed",
        project_type: Some(ProjectType::Brownfield),
        problem_framing: Some(ProblemFraming::WellDefined),
        team_size: Some(TeamSize::Large),
        timeline: Some(Timeline::Fixed),
        risk_tolerance: Some(RiskTolerance::Low),
        methodology: Methodology::Staged,
        rationale: "A large team changing an existing system against a fixed date with little risk appetite needs gated, signed-off phases",
    },
    MethodologyRule {
        name: "exploratory-low-risk",
        project_type: None,
        problem_framing: Some(ProblemFraming::Exploratory),
        team_size: None,
        timeline: None,
        risk_tolerance: Some(RiskTolerance::Low),
        methodology: Methodology::RiskDriven,
        rationale: "An open problem with low risk tolerance calls for retiring the biggest unknowns before committing",
    },
    MethodologyRule {
        name: "defined-fixed",
        project_type: None,
        problem_framing: Some(ProblemFraming::WellDefined),
        team_size: None,
        timeline: Some(Timeline::Fixed),
        risk_tolerance: None,
        methodology: Methodology::Staged,
        rationale: "A well-understood problem on a fixed timeline fits sequential phases with clear exit criteria",
    },
    MethodologyRule {
        name: "brownfield-defined",
        project_type: Some(ProjectType::Brownfield),
        problem_framing: Some(ProblemFraming::WellDefined),
        team_size: None,
        timeline: None,
        risk_tolerance: None,
        methodology: Methodology::Incremental,
        rationale: "Known changes to an existing system ship safely as small slices around a protected core",
    },
    MethodologyRule {
        name: "exploratory-flexible",
        project_type: None,
        problem_framing: Some(ProblemFraming::Exploratory),
        team_size: None,
        timeline: Some(Timeline::Flexible),
        risk_tolerance: None,
        methodology: Methodology::LightweightIterative,
        rationale: "An open problem with a flexible timeline benefits from fast feedback loops",
    },
];

const FALLBACK_RATIONALE: &str =
    "No rule matched the supplied signals; hybrid balances staged milestones with iterative delivery";

/// Outcome of methodology selection; immutable once stored on a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologySelection {
    pub methodology: Methodology,
    pub signals: ProjectSignals,
    pub rationale: String,
    /// Name of the matched rule, or None for the fallback
    pub rule: Option<String>,
}

impl MethodologySelection {
    pub fn is_fallback(&self) -> bool {
        self.rule.is_none()
    }
}

/// Pick a methodology from the builtin table; never fails
pub fn select(signals: &ProjectSignals) -> MethodologySelection {
    select_with(METHODOLOGY_RULES, signals)
}

/// Pick a methodology from a specific table
pub fn select_with(rules: &[MethodologyRule], signals: &ProjectSignals) -> MethodologySelection {
    debug!(signals = %signals.describe(), rule_count = rules.len(), "select_with: called");

    match rules.iter().find(|rule| rule.matches(signals)) {
        Some(rule) => {
            info!(rule = rule.name, methodology = %rule.methodology, "Methodology selected");
            MethodologySelection {
                methodology: rule.methodology,
                signals: signals.clone(),
                rationale: rule.rationale.to_string(),
                rule: Some(rule.name.to_string()),
            }
        }
        None => {
            info!(methodology = %Methodology::Hybrid, "No methodology rule matched, using fallback");
            MethodologySelection {
                methodology: Methodology::Hybrid,
                signals: signals.clone(),
                rationale: FALLBACK_RATIONALE.to_string(),
                rule: None,
            }
        }
    }
}
