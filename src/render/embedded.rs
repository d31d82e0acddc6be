//! Embedded fallback templates
//!
//! These are compiled into the binary and used when no override file exists.

/// Architecture decision record
pub const ADR: &str = r#"# {{title}}

- Id: `{{id}}`
- Status: {{body.status}}
- Confidence: {{confidence_pct}}%
- Generated: {{generated_at}}

## Context

{{body.context}}

## Decision

{{body.decision}}

## Rationale

{{body.rationale}}
{{#if body.consequences}}

## Consequences

{{#each body.consequences}}
- {{this}}
{{/each}}
{{/if}}
{{#if body.alternatives}}

## Alternatives Considered

{{#each body.alternatives}}
- {{this}}
{{/each}}
{{/if}}
"#;

/// Design specification
pub const SPECIFICATION: &str = r#"# {{title}}

- Id: `{{id}}`
- Confidence: {{confidence_pct}}%
- Generated: {{generated_at}}

## Goal

{{body.goal}}
{{#if body.context}}

## Context

{{body.context}}
{{/if}}

## Requirements

{{#each body.requirements}}
- [{{#if covered}}x{{else}} {{/if}}] {{text}}
{{else}}
_No requirements were declared._
{{/each}}

## Constraints

{{#each body.constraints}}
- **{{id}}** ({{category}}{{#if mandatory}}, mandatory{{/if}}): {{description}}
{{else}}
_No constraints apply._
{{/each}}
{{#if body.phase_notes}}

## Phase Notes

{{#each body.phase_notes}}
### {{phase}} ({{status}}, {{pct coverage}})

{{excerpt}}

{{/each}}
{{/if}}
"#;

/// Delivery roadmap
pub const ROADMAP: &str = r#"# {{title}}

- Id: `{{id}}`
- Methodology: {{#if body.methodology}}{{body.methodology}}{{else}}not selected{{/if}}
- Current phase: {{body.current_phase}}
- Completion: {{pct body.completion}}

## Milestones

| Phase | Status | Coverage | Focus |
|-------|--------|----------|-------|
{{#each body.milestones}}
| {{phase}} | {{status}} | {{pct coverage}} | {{focus}} |
{{/each}}
"#;

/// Coverage report
pub const COVERAGE: &str = r#"## Coverage: {{phase}}

| Dimension | Score |
|-----------|-------|
| Requirements | {{pct requirements}} |
| Constraints | {{pct constraints}} |
| Documentation | {{pct documentation}} |
| Testing | {{pct testing}} |
| **Overall** | **{{pct overall}}** |
{{#if missing_requirements}}

### Missing requirements

{{#each missing_requirements}}
- {{this}}
{{/each}}
{{/if}}
{{#if unsatisfied_constraints}}

### Unsatisfied mandatory constraints

{{#each unsatisfied_constraints}}
- {{this}}
{{/each}}
{{/if}}
"#;

/// Get the embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "adr" => Some(ADR),
        "specification" => Some(SPECIFICATION),
        "roadmap" => Some(ROADMAP),
        "coverage" => Some(COVERAGE),
        _ => None,
    }
}
