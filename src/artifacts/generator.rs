//! ArtifactGenerator - structured artifacts from session state
//!
//! Each requested type is built independently: a type that cannot be built
//! turns into a [`GenerationWarning`] and the rest of the batch still runs.
//! Generation reads the session and never changes it; the engine appends the
//! results.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::coverage::rules::{NormalizedText, statement_covered};
use crate::domain::{
    Artifact, ArtifactBody, ArtifactType, ConstraintEntry, DecisionRecord, DecisionStatus, Milestone, PhaseNote,
    PhaseStatus, RequirementEntry, Roadmap, Session, SpecificationDoc,
};
use crate::methodology::Methodology;

/// Confidence given to a placeholder decision record
pub const MINIMAL_CONFIDENCE: f64 = 0.1;

/// Phase whose content backs a decision record
const ARCHITECTURE_PHASE: &str = "architecture";

/// Characters kept from phase content in excerpts
const EXCERPT_CHARS: usize = 280;

/// One artifact type that could not be (fully) generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationWarning {
    pub artifact_type: ArtifactType,
    pub message: String,
}

impl GenerationWarning {
    fn new(artifact_type: ArtifactType, message: impl Into<String>) -> Self {
        Self {
            artifact_type,
            message: message.into(),
        }
    }
}

/// Successful artifacts plus warnings for the types that fell short
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub artifacts: Vec<Artifact>,
    pub warnings: Vec<GenerationWarning>,
}

impl GenerationResult {
    pub fn generated_types(&self) -> Vec<ArtifactType> {
        self.artifacts.iter().map(|a| a.artifact_type).collect()
    }
}

/// What building one type produced
type Built = Result<(Artifact, Option<GenerationWarning>), GenerationWarning>;

/// Builds artifacts from session state
#[derive(Debug, Clone)]
pub struct ArtifactGenerator {
    keyword_match_ratio: f64,
}

impl Default for ArtifactGenerator {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl ArtifactGenerator {
    pub fn new(keyword_match_ratio: f64) -> Self {
        Self { keyword_match_ratio }
    }

    /// Generate each requested type; duplicates are generated once
    pub fn generate(&self, session: &Session, types: &[ArtifactType]) -> GenerationResult {
        debug!(session_id = %session.id, ?types, "ArtifactGenerator::generate: called");
        let mut result = GenerationResult::default();
        let mut seen = Vec::new();

        for &artifact_type in types {
            if seen.contains(&artifact_type) {
                continue;
            }
            seen.push(artifact_type);

            let built = match artifact_type {
                ArtifactType::Adr => self.decision_record(session),
                ArtifactType::Specification => self.specification(session),
                ArtifactType::Roadmap => Ok((self.roadmap(session), None)),
            };
            match built {
                Ok((artifact, warning)) => {
                    result.artifacts.push(artifact);
                    result.warnings.extend(warning);
                }
                Err(warning) => {
                    warn!(session_id = %session.id, %artifact_type, message = %warning.message, "Artifact not generated");
                    result.warnings.push(warning);
                }
            }
        }

        info!(
            session_id = %session.id,
            generated = result.artifacts.len(),
            warnings = result.warnings.len(),
            "Artifacts generated"
        );
        result
    }

    /// Decision record, specification and roadmap together
    pub fn bundle(&self, session: &Session) -> GenerationResult {
        self.generate(session, &ArtifactType::ALL)
    }

    fn decision_record(&self, session: &Session) -> Built {
        debug!(session_id = %session.id, "decision_record: called");
        let architecture = session
            .phase_record(ARCHITECTURE_PHASE)
            .filter(|r| !r.content.trim().is_empty());
        let context = join_context(&session.config.context, &session.config.goal);

        if let Some(selection) = &session.methodology {
            let alternatives = Methodology::ALL
                .into_iter()
                .filter(|m| *m != selection.methodology)
                .map(|m| m.to_string())
                .collect();
            let (status, confidence) = match architecture {
                Some(record) if record.status == PhaseStatus::Validated => (DecisionStatus::Accepted, 0.9),
                Some(_) => (DecisionStatus::Proposed, 0.75),
                None if selection.is_fallback() => (DecisionStatus::Proposed, 0.4),
                None => (DecisionStatus::Proposed, 0.6),
            };
            let record = DecisionRecord {
                status,
                context: format!("{} Signals: {}.", context, selection.signals.describe()),
                decision: format!("Adopt the {} delivery methodology", selection.methodology),
                rationale: selection.rationale.clone(),
                consequences: selection
                    .methodology
                    .practices()
                    .iter()
                    .map(|p| p.to_string())
                    .collect(),
                alternatives,
            };
            let title = format!("Adopt {} methodology", selection.methodology);
            return Ok((
                Artifact::new(ArtifactType::Adr, title, ArtifactBody::DecisionRecord(record), confidence),
                None,
            ));
        }

        if let Some(record) = architecture {
            let decision = first_line(&record.content);
            let status = if record.status == PhaseStatus::Validated {
                DecisionStatus::Accepted
            } else {
                DecisionStatus::Proposed
            };
            let body = DecisionRecord {
                status,
                context,
                decision: decision.clone(),
                rationale: format!(
                    "Derived from the architecture phase ({}, {:.1}% coverage)",
                    record.status, record.coverage
                ),
                consequences: bullet_items(&record.content),
                alternatives: Vec::new(),
            };
            let confidence = (record.coverage / 100.0 * 0.8).max(MINIMAL_CONFIDENCE);
            return Ok((
                Artifact::new(ArtifactType::Adr, decision, ArtifactBody::DecisionRecord(body), confidence),
                None,
            ));
        }

        let body = DecisionRecord {
            status: DecisionStatus::Proposed,
            context,
            decision: "No decision recorded yet".to_string(),
            rationale: "Neither a methodology selection nor architecture content is available".to_string(),
            consequences: Vec::new(),
            alternatives: Vec::new(),
        };
        let artifact = Artifact::new(
            ArtifactType::Adr,
            format!("Pending decision for {}", session.config.goal),
            ArtifactBody::DecisionRecord(body),
            MINIMAL_CONFIDENCE,
        );
        let warning = GenerationWarning::new(
            ArtifactType::Adr,
            "Insufficient data for a decision record: no methodology selection or architecture content; generated a minimal-confidence placeholder",
        );
        Ok((artifact, Some(warning)))
    }

    fn specification(&self, session: &Session) -> Built {
        debug!(session_id = %session.id, "specification: called");
        let validated = session.validated_content();
        if session.config.requirements.is_empty() && validated.is_empty() {
            return Err(GenerationWarning::new(
                ArtifactType::Specification,
                "Cannot generate a specification: the session has no requirements and no validated phase content",
            ));
        }

        let all_content: String = session
            .records_in_order()
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let text = NormalizedText::new(&all_content);
        let requirements: Vec<RequirementEntry> = session
            .config
            .requirements
            .iter()
            .map(|r| RequirementEntry {
                text: r.clone(),
                covered: statement_covered(&text, r, self.keyword_match_ratio),
            })
            .collect();
        let constraints = session
            .constraints
            .all()
            .iter()
            .map(|c| ConstraintEntry {
                id: c.id.clone(),
                category: c.category.clone(),
                description: c.description.clone(),
                mandatory: c.mandatory,
            })
            .collect();
        let phase_notes = session
            .records_in_order()
            .into_iter()
            .filter(|r| !r.content.trim().is_empty())
            .map(|r| PhaseNote {
                phase: r.phase.clone(),
                status: r.status,
                coverage: r.coverage,
                excerpt: excerpt(&r.content),
            })
            .collect();

        let covered_ratio = if requirements.is_empty() {
            1.0
        } else {
            requirements.iter().filter(|r| r.covered).count() as f64 / requirements.len() as f64
        };
        let validated_ratio = validated.len() as f64 / session.phases.len() as f64;
        let confidence = 0.2 + 0.5 * covered_ratio + 0.3 * validated_ratio;

        let doc = SpecificationDoc {
            goal: session.config.goal.clone(),
            context: session.config.context.clone(),
            requirements,
            constraints,
            phase_notes,
        };
        let title = format!("Specification: {}", session.config.goal);
        Ok((
            Artifact::new(ArtifactType::Specification, title, ArtifactBody::Specification(doc), confidence),
            None,
        ))
    }

    fn roadmap(&self, session: &Session) -> Artifact {
        debug!(session_id = %session.id, "roadmap: called");
        let milestones: Vec<Milestone> = session
            .phases
            .iter()
            .map(|phase| {
                let record = session.phase_record(phase);
                Milestone {
                    phase: phase.to_string(),
                    status: record.map(|r| r.status).unwrap_or_default(),
                    coverage: record.map(|r| r.coverage).unwrap_or(0.0),
                    focus: phase_focus(phase),
                }
            })
            .collect();
        let done = milestones.iter().filter(|m| m.status.is_done()).count();
        let completion = done as f64 / milestones.len().max(1) as f64 * 100.0;

        let roadmap = Roadmap {
            methodology: session.methodology.as_ref().map(|m| m.methodology.to_string()),
            current_phase: session.current_phase.clone(),
            completion,
            milestones,
        };
        let confidence = 0.5 + 0.5 * completion / 100.0;
        let title = format!("Roadmap: {}", session.config.goal);
        Artifact::new(ArtifactType::Roadmap, title, ArtifactBody::Roadmap(roadmap), confidence)
    }
}

fn join_context(context: &str, goal: &str) -> String {
    let context = context.trim();
    if context.is_empty() {
        format!("Goal: {}.", goal.trim())
    } else {
        format!("{} Goal: {}.", context, goal.trim())
    }
}

/// First non-empty line without markdown heading or bullet markers
fn first_line(content: &str) -> String {
    content
        .lines()
        .map(|l| l.trim().trim_start_matches('#').trim_start_matches(['-', '*']).trim())
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn bullet_items(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim_start)
        .filter_map(|l| l.strip_prefix("- ").or_else(|| l.strip_prefix("* ")))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn excerpt(content: &str) -> String {
    let content = content.trim();
    if content.chars().count() <= EXCERPT_CHARS {
        return content.to_string();
    }
    let cut: String = content.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

fn phase_focus(phase: &str) -> String {
    match phase {
        "discovery" => "Understand stakeholders, the problem and its context".to_string(),
        "requirements" => "Agree on functional and non-functional requirements".to_string(),
        "architecture" => "Choose the system structure and record key decisions".to_string(),
        "specification" => "Pin down interfaces, data formats and behaviour".to_string(),
        "planning" => "Sequence milestones and name delivery risks".to_string(),
        "validation" => "Prove the design against requirements and tests".to_string(),
        other => format!("Complete the {} phase", other),
    }
}
