//! Pivot decision engine

mod engine;

pub use engine::{IndicatorKind, PivotDecision, PivotEngine, PivotIndicator, Severity};
