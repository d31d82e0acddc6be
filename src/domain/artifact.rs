//! Artifact domain types
//!
//! Artifacts are structured data. Turning them into markdown or any other
//! dialect is the job of a renderer (see `crate::render`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::generate_id;
use super::phase::PhaseStatus;

/// Kind of generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactType {
    Adr,
    Specification,
    Roadmap,
}

impl ArtifactType {
    /// The "document everything now" bundle, in generation order
    pub const ALL: [ArtifactType; 3] = [Self::Adr, Self::Specification, Self::Roadmap];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adr => "adr",
            Self::Specification => "specification",
            Self::Roadmap => "roadmap",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ArtifactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "adr" | "decision" | "decision-record" => Ok(Self::Adr),
            "specification" | "spec" => Ok(Self::Specification),
            "roadmap" | "plan" => Ok(Self::Roadmap),
            _ => Err(format!("Unknown artifact type: {}. Use: adr, specification, or roadmap", s)),
        }
    }
}

/// Lifecycle of a decision record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionStatus {
    /// Not enough evidence to accept yet
    Proposed,
    Accepted,
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proposed => write!(f, "proposed"),
            Self::Accepted => write!(f, "accepted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub status: DecisionStatus,
    pub context: String,
    pub decision: String,
    pub rationale: String,
    pub consequences: Vec<String>,
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementEntry {
    pub text: String,
    /// Whether any submitted phase content covers this requirement
    pub covered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintEntry {
    pub id: String,
    pub category: String,
    pub description: String,
    pub mandatory: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseNote {
    pub phase: String,
    pub status: PhaseStatus,
    pub coverage: f64,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationDoc {
    pub goal: String,
    pub context: String,
    pub requirements: Vec<RequirementEntry>,
    pub constraints: Vec<ConstraintEntry>,
    pub phase_notes: Vec<PhaseNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub phase: String,
    pub status: PhaseStatus,
    pub coverage: f64,
    pub focus: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub methodology: Option<String>,
    pub current_phase: String,
    /// Percentage of phases validated or skipped
    pub completion: f64,
    pub milestones: Vec<Milestone>,
}

/// Structured artifact content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ArtifactBody {
    DecisionRecord(DecisionRecord),
    Specification(SpecificationDoc),
    Roadmap(Roadmap),
}

/// A generated artifact; never mutated once appended to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub artifact_type: ArtifactType,
    pub title: String,
    pub body: ArtifactBody,
    /// 0.0 to 1.0; low values mean the artifact was built from thin evidence
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(artifact_type: ArtifactType, title: impl Into<String>, body: ArtifactBody, confidence: f64) -> Self {
        let title = title.into();
        Self {
            id: generate_id(artifact_type.as_str(), &title),
            artifact_type,
            title,
            body,
            confidence: confidence.clamp(0.0, 1.0),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_type_from_str() {
        assert_eq!("adr".parse::<ArtifactType>(), Ok(ArtifactType::Adr));
        assert_eq!("Spec".parse::<ArtifactType>(), Ok(ArtifactType::Specification));
        assert_eq!("roadmap".parse::<ArtifactType>(), Ok(ArtifactType::Roadmap));
        assert!("poem".parse::<ArtifactType>().is_err());
    }

    #[test]
    fn test_artifact_new_clamps_confidence() {
        let body = ArtifactBody::Roadmap(Roadmap {
            methodology: None,
            current_phase: "discovery".into(),
            completion: 0.0,
            milestones: vec![],
        });
        let artifact = Artifact::new(ArtifactType::Roadmap, "Roadmap", body, 1.7);
        assert_eq!(artifact.confidence, 1.0);
        assert!(artifact.id.contains("-roadmap-"));
    }

    #[test]
    fn test_artifact_body_tagged() {
        let body = ArtifactBody::DecisionRecord(DecisionRecord {
            status: DecisionStatus::Proposed,
            context: "c".into(),
            decision: "d".into(),
            rationale: "r".into(),
            consequences: vec![],
            alternatives: vec![],
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["kind"], "decision-record");
        assert_eq!(json["status"], "proposed");
    }
}
