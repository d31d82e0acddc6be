//! Project signals used to pick a delivery methodology
//!
//! Every field is optional. Values that don't parse are dropped to `None`
//! instead of failing, so a typo in a scenario never blocks session creation.

use serde::{Deserialize, Deserializer, Serialize};

macro_rules! signal_enum {
    (@first $first:literal $(, $rest:literal)*) => { $first };
    ($(#[$meta:meta])* $name:ident { $($variant:ident => [$($alias:literal),+]),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
                match normalized.as_str() {
                    $($($alias)|+ => Ok(Self::$variant),)+
                    _ => Err(format!("Unknown {}: {}", stringify!($name), s)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let name = match self {
                    $(Self::$variant => signal_enum!(@first $($alias),+),)+
                };
                write!(f, "{}", name)
            }
        }
    };
}

signal_enum!(
    /// Whether the work starts from scratch or changes an existing system
    ProjectType {
        Greenfield => ["greenfield", "new"],
        Brownfield => ["brownfield", "existing", "legacy"],
    }
);

signal_enum!(
    /// How well the problem is understood
    ProblemFraming {
        Exploratory => ["exploratory", "open", "ambiguous"],
        WellDefined => ["well-defined", "welldefined", "defined", "clear"],
    }
);

signal_enum!(
    TeamSize {
        Small => ["small", "solo"],
        Medium => ["medium"],
        Large => ["large"],
    }
);

signal_enum!(
    Timeline {
        Flexible => ["flexible"],
        Moderate => ["moderate"],
        Fixed => ["fixed", "hard-deadline"],
    }
);

signal_enum!(
    RiskTolerance {
        High => ["high"],
        Medium => ["medium", "moderate"],
        Low => ["low"],
    }
);

/// The signal tuple supplied at session start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProjectSignals {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub problem_framing: Option<ProblemFraming>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub team_size: Option<TeamSize>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub risk_tolerance: Option<RiskTolerance>,
}

impl ProjectSignals {
    /// Build from raw strings, dropping anything unrecognized
    pub fn parse(
        project_type: Option<&str>,
        problem_framing: Option<&str>,
        team_size: Option<&str>,
        timeline: Option<&str>,
        risk_tolerance: Option<&str>,
    ) -> Self {
        Self {
            project_type: project_type.and_then(|s| s.parse().ok()),
            problem_framing: problem_framing.and_then(|s| s.parse().ok()),
            team_size: team_size.and_then(|s| s.parse().ok()),
            timeline: timeline.and_then(|s| s.parse().ok()),
            risk_tolerance: risk_tolerance.and_then(|s| s.parse().ok()),
        }
    }

    /// Number of recognized signals
    pub fn known_count(&self) -> usize {
        [
            self.project_type.is_some(),
            self.problem_framing.is_some(),
            self.team_size.is_some(),
            self.timeline.is_some(),
            self.risk_tolerance.is_some(),
        ]
        .iter()
        .filter(|known| **known)
        .count()
    }

    /// `key=value` summary with unknown slots shown as "?"
    pub fn describe(&self) -> String {
        fn slot<T: std::fmt::Display>(value: &Option<T>) -> String {
            value.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "?".to_string())
        }
        format!(
            "project-type={}, problem-framing={}, team-size={}, timeline={}, risk-tolerance={}",
            slot(&self.project_type),
            slot(&self.problem_framing),
            slot(&self.team_size),
            slot(&self.timeline),
            slot(&self.risk_tolerance),
        )
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
{
    // Any shape is accepted; only strings (or scalars rendered as strings) can parse
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    let text = match raw {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => return Ok(None),
    };
    Ok(text.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Greenfield".parse::<ProjectType>(), Ok(ProjectType::Greenfield));
        assert_eq!("well_defined".parse::<ProblemFraming>(), Ok(ProblemFraming::WellDefined));
        assert_eq!("Well Defined".parse::<ProblemFraming>(), Ok(ProblemFraming::WellDefined));
        assert_eq!("hard-deadline".parse::<Timeline>(), Ok(Timeline::Fixed));
        assert!("huge".parse::<TeamSize>().is_err());
    }

    #[test]
    fn test_display_uses_canonical_name() {
        assert_eq!(ProjectType::Brownfield.to_string(), "brownfield");
        assert_eq!(ProblemFraming::WellDefined.to_string(), "well-defined");
        assert_eq!(RiskTolerance::Medium.to_string(), "medium");
    }

    #[test]
    fn test_deserialize_lenient() {
        let yaml = r#"
project-type: greenfield
problem-framing: exploratory
team-size: gigantic
timeline: flexible
"#;
        let signals: ProjectSignals = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(signals.project_type, Some(ProjectType::Greenfield));
        assert_eq!(signals.team_size, None);
        assert_eq!(signals.risk_tolerance, None);
        assert_eq!(signals.known_count(), 3);
    }

    #[test]
    fn test_deserialize_lenient_non_string_values() {
        let json = serde_json::json!({
            "project-type": "brownfield",
            "team-size": 5,
            "timeline": true,
            "risk-tolerance": ["high"],
            "problem-framing": {"kind": "exploratory"},
        });
        let signals: ProjectSignals = serde_json::from_value(json).unwrap();
        assert_eq!(signals.project_type, Some(ProjectType::Brownfield));
        assert_eq!(signals.team_size, None);
        assert_eq!(signals.timeline, None);
        assert_eq!(signals.risk_tolerance, None);
        assert_eq!(signals.problem_framing, None);
        assert_eq!(signals.known_count(), 1);

        let yaml = "team-size: 12\nrisk-tolerance: null\ntimeline: fixed\n";
        let signals: ProjectSignals = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(signals.team_size, None);
        assert_eq!(signals.risk_tolerance, None);
        assert_eq!(signals.timeline, Some(Timeline::Fixed));
    }

    #[test]
    fn test_describe() {
        let signals = ProjectSignals::parse(Some("greenfield"), None, Some("small"), None, Some("bogus"));
        assert_eq!(
            signals.describe(),
            "project-type=greenfield, problem-framing=?, team-size=small, timeline=?, risk-tolerance=?"
        );
    }
}
