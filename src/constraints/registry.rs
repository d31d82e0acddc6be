//! ConstraintRegistry - indexed, immutable set of design constraints
//!
//! Constraint configuration is a list of definitions, given either as a
//! top-level sequence or as a mapping with a single `constraints:` sequence.
//! Loading is all-or-nothing: any malformed entry rejects the whole list.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::coverage::rules::keywords;
use crate::error::{EngineError, EngineResult};

/// Builtin constraint configuration (embedded in binary)
const BUILTIN_CONSTRAINTS: &str = include_str!("builtin/default.yml");

fn default_category() -> String {
    "general".to_string()
}

/// A named rule that applies to one or more phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraint {
    pub id: String,

    #[serde(default = "default_category")]
    pub category: String,

    pub description: String,

    #[serde(default)]
    pub mandatory: bool,

    /// Phases this constraint applies to; empty means every phase
    #[serde(default)]
    pub phases: Vec<String>,

    /// Words whose presence satisfies the constraint; defaults to the
    /// significant words of the description
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Constraint {
    pub fn applies_to(&self, phase: &str) -> bool {
        self.phases.is_empty() || self.phases.iter().any(|p| p == phase)
    }

    /// Keywords used to detect satisfaction in submitted content
    pub fn match_keywords(&self) -> Vec<String> {
        if self.keywords.is_empty() {
            keywords(&self.description)
        } else {
            self.keywords.iter().map(|k| k.to_lowercase()).collect()
        }
    }

    fn normalize(mut self) -> Self {
        self.id = self.id.trim().to_string();
        self.category = self.category.trim().to_lowercase();
        self.description = self.description.trim().to_string();
        self.phases = self.phases.iter().map(|p| p.trim().to_lowercase()).collect();
        self
    }
}

/// Counts reported after a successful load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSummary {
    pub accepted: usize,
    pub mandatory: usize,
    pub categories: Vec<String>,
}

/// In-memory index over a validated list of constraints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintRegistry {
    constraints: Vec<Constraint>,
    by_id: HashMap<String, usize>,
}

impl ConstraintRegistry {
    /// Load the builtin default configuration
    pub fn builtin() -> EngineResult<Self> {
        debug!("ConstraintRegistry::builtin: called");
        Self::from_yaml_str(BUILTIN_CONSTRAINTS)
    }

    /// Load from YAML (or JSON) text
    pub fn from_yaml_str(content: &str) -> EngineResult<Self> {
        let value: serde_json::Value = serde_yaml::from_str(content)
            .map_err(|e| EngineError::config(format!("malformed constraint configuration: {}", e)))?;
        Self::from_value(value)
    }

    /// Load from a file on disk
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        debug!(?path, "ConstraintRegistry::from_file: called");
        let content = fs::read_to_string(path)
            .map_err(|e| EngineError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    /// Load from an already-decoded configuration value
    pub fn from_value(value: serde_json::Value) -> EngineResult<Self> {
        debug!("ConstraintRegistry::from_value: called");
        let items = match value {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(mut map) if map.len() == 1 && map.contains_key("constraints") => {
                match map.remove("constraints") {
                    Some(serde_json::Value::Array(items)) => items,
                    _ => {
                        return Err(EngineError::config("'constraints' must be a list of constraint definitions"));
                    }
                }
            }
            other => {
                return Err(EngineError::config(format!(
                    "constraint configuration must be a list, got {}",
                    value_kind(&other)
                )));
            }
        };

        let mut constraints = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let constraint: Constraint = serde_json::from_value(item)
                .map_err(|e| EngineError::config(format!("constraint #{} is malformed: {}", i + 1, e)))?;
            constraints.push(constraint.normalize());
        }

        Self::from_constraints(constraints)
    }

    /// Build from constraint values, validating ids and descriptions
    pub fn from_constraints(constraints: Vec<Constraint>) -> EngineResult<Self> {
        let mut by_id = HashMap::with_capacity(constraints.len());
        for (i, c) in constraints.iter().enumerate() {
            if c.id.is_empty() {
                return Err(EngineError::config(format!("constraint #{} has an empty id", i + 1)));
            }
            if c.description.is_empty() {
                return Err(EngineError::config(format!("constraint '{}' has an empty description", c.id)));
            }
            if c.phases.iter().any(|p| p.is_empty()) {
                return Err(EngineError::config(format!("constraint '{}' lists an empty phase name", c.id)));
            }
            if by_id.insert(c.id.clone(), i).is_some() {
                return Err(EngineError::config(format!("duplicate constraint id '{}'", c.id)));
            }
        }

        let registry = Self { constraints, by_id };
        info!(
            count = registry.len(),
            mandatory = registry.mandatory_count(),
            "Loaded constraints"
        );
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Constraint> {
        self.by_id.get(id).map(|&i| &self.constraints[i])
    }

    pub fn all(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn mandatory_count(&self) -> usize {
        self.constraints.iter().filter(|c| c.mandatory).count()
    }

    /// Constraints that apply to a phase, in configuration order
    pub fn constraints_for(&self, phase: &str) -> Vec<&Constraint> {
        self.constraints.iter().filter(|c| c.applies_to(phase)).collect()
    }

    /// Mandatory constraints that apply to a phase
    pub fn mandatory_for(&self, phase: &str) -> Vec<&Constraint> {
        self.constraints
            .iter()
            .filter(|c| c.mandatory && c.applies_to(phase))
            .collect()
    }

    /// Mandatory constraints for a phase whose id is not in `satisfied`
    pub fn mandatory_unsatisfied(&self, phase: &str, satisfied: &HashSet<String>) -> Vec<&Constraint> {
        debug!(%phase, satisfied = satisfied.len(), "mandatory_unsatisfied: called");
        self.mandatory_for(phase)
            .into_iter()
            .filter(|c| !satisfied.contains(&c.id))
            .collect()
    }

    /// A registry holding only the given ids, in the order given
    pub fn restrict(&self, ids: &[String]) -> EngineResult<Self> {
        debug!(count = ids.len(), "restrict: called");
        let mut subset = Vec::with_capacity(ids.len());
        for id in ids {
            let constraint = self
                .get(id.trim())
                .ok_or_else(|| EngineError::config(format!("unknown constraint id '{}'", id)))?;
            subset.push(constraint.clone());
        }
        Self::from_constraints(subset)
    }

    pub fn summary(&self) -> ConstraintSummary {
        let categories: BTreeSet<String> = self.constraints.iter().map(|c| c.category.clone()).collect();
        ConstraintSummary {
            accepted: self.len(),
            mandatory: self.mandatory_count(),
            categories: categories.into_iter().collect(),
        }
    }
}

fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "nothing",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "a mapping",
    }
}
