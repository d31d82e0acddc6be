//! Property tests: coverage is a pure function of the submitted content

use designflow::config::Config;
use designflow::constraints::ConstraintRegistry;
use designflow::coverage::{CoverageCalculator, PhaseSubmission};
use designflow::domain::SessionConfig;
use designflow::session::DesignEngine;
use proptest::prelude::*;

fn requirements() -> Vec<String> {
    vec![
        "Support OAuth login".to_string(),
        "Export invoices as PDF".to_string(),
        "Audit every admin action".to_string(),
    ]
}

fn started_engine() -> DesignEngine {
    let mut engine = DesignEngine::from_config(&Config::default()).unwrap();
    let mut config = SessionConfig::new("Billing portal");
    config.id = Some("prop".to_string());
    config.requirements = requirements();
    engine.start(config, None).unwrap();
    engine
}

fn content_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("# Overview".to_string()),
            Just("- OAuth login for admins".to_string()),
            Just("We assume the export is small.".to_string()),
            Just("Benchmarked and verified.".to_string()),
            Just("Invoices export as PDF".to_string()),
            Just("Stakeholders and target users identified".to_string()),
            "[a-z ]{0,40}",
        ],
        0..12,
    )
    .prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn test_calculator_is_deterministic(content in content_strategy()) {
        let calc = CoverageCalculator::default();
        let registry = ConstraintRegistry::builtin().unwrap();
        let constraints = registry.constraints_for("discovery");
        let submission = PhaseSubmission::new(content);

        let first = calc.score("discovery", &submission, &constraints, &requirements());
        let second = calc.score("discovery", &submission, &constraints, &requirements());
        prop_assert_eq!(&first, &second);
        prop_assert!((0.0..=100.0).contains(&first.overall));
    }

    #[test]
    fn test_sessions_score_identical_content_identically(content in content_strategy()) {
        let mut a = started_engine();
        let mut b = started_engine();

        let first = a.advance("prop", &PhaseSubmission::new(content.clone())).unwrap();
        let second = b.advance("prop", &PhaseSubmission::new(content)).unwrap();
        prop_assert_eq!(first.coverage.overall, second.coverage.overall);
        prop_assert_eq!(first.success, second.success);

        let status_a = a.status("prop").unwrap();
        let status_b = b.status("prop").unwrap();
        prop_assert_eq!(status_a.coverage.overall(), status_b.coverage.overall());
    }
}
