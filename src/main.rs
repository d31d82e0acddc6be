//! designflow - Design Session Orchestration Engine
//!
//! CLI entry point for running scripted sessions and inspecting the
//! constraint, methodology and phase configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{info, warn};

use designflow::cli::{Cli, Command, OutputFormat};
use designflow::config::Config;
use designflow::constraints::ConstraintRegistry;
use designflow::coverage::CoverageReport;
use designflow::methodology::{ProjectSignals, select};
use designflow::render::{ArtifactRenderer, MarkdownRenderer};
use designflow::scenario::{Scenario, StepOutcome};
use designflow::session::{DesignEngine, SessionManager, SessionResponse};

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("designflow")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Write to the log file so stdout stays clean for JSON output
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("designflow.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        "designflow loaded config: phases={}, threshold={}",
        config.workflow.phases.len(),
        config.workflow.coverage_threshold
    );

    match cli.command {
        Some(Command::Run { scenario, format }) => cmd_run(&config, &scenario, format).await,
        Some(Command::Constraints { file, format }) => cmd_constraints(&config, file.as_deref(), format),
        Some(Command::Methodology {
            project_type,
            problem_framing,
            team_size,
            timeline,
            risk_tolerance,
            format,
        }) => {
            let signals = ProjectSignals::parse(
                project_type.as_deref(),
                problem_framing.as_deref(),
                team_size.as_deref(),
                timeline.as_deref(),
                risk_tolerance.as_deref(),
            );
            cmd_methodology(&signals, format)
        }
        Some(Command::Phases) => cmd_phases(&config),
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Run a scripted session
async fn cmd_run(config: &Config, path: &Path, format: OutputFormat) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let engine = DesignEngine::from_config(config).context("Failed to build design engine")?;
    let manager = SessionManager::spawn(engine);

    let result = scenario.run(&manager).await;
    manager.shutdown().await?;
    let run = match result {
        Ok(run) => run,
        Err(e) => {
            warn!("Scenario failed: {}", e);
            for rec in e.recommendations() {
                eprintln!("{} {}", "hint:".yellow(), rec);
            }
            return Err(e).context(format!("Scenario {} failed", path.display()));
        }
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    let renderer = MarkdownRenderer::new(config.render.template_dir.as_ref());
    print_session(&run.started, "started");
    for (i, outcome) in run.steps.iter().enumerate() {
        println!();
        print_outcome(i + 1, outcome, &renderer)?;
    }
    println!();
    print_session(&run.finished, "final");
    Ok(())
}

fn print_session(response: &SessionResponse, label: &str) {
    println!(
        "{} {} [{}] phase: {}",
        format!("session {}:", label).bold(),
        response.session_id,
        response.status,
        response.current_phase.cyan()
    );
    println!(
        "  phases complete: {:.1}%  assumptions backed: {:.1}%",
        response.coverage.phases, response.coverage.assumptions
    );
    if let Some(selection) = &response.methodology {
        println!("  methodology: {} ({})", selection.methodology, selection.rationale);
    }
    for rec in &response.recommendations {
        println!("  - {}", rec);
    }
}

fn print_outcome(n: usize, outcome: &StepOutcome, renderer: &MarkdownRenderer) -> Result<()> {
    match outcome {
        StepOutcome::Advance(r) | StepOutcome::Skip(r) => {
            let verb = if matches!(outcome, StepOutcome::Skip(_)) { "skip" } else { "advance" };
            let mark = if r.success { "ok".green() } else { "blocked".red() };
            println!("{} {} {}: {} -> {}", format!("[{}]", n).dimmed(), verb, mark, r.phase, r.current_phase);
            print_report(&r.coverage);
            if let Some(reason) = &r.failure_reason {
                println!("  reason: {}", reason);
            }
            for rec in &r.recommendations {
                println!("  - {}", rec);
            }
        }
        StepOutcome::Validate(r) => {
            let mark = if r.would_advance { "passes".green() } else { "short".yellow() };
            println!("{} validate {}: {}", format!("[{}]", n).dimmed(), r.report.phase, mark);
            print!("{}", renderer.render_coverage(&r.report)?);
        }
        StepOutcome::Pivot(r) => {
            let d = &r.decision;
            let mark = if d.recommend_pivot { "pivot".red() } else { "continue".green() };
            println!(
                "{} pivot: {} (severity {}, confidence {:.2})",
                format!("[{}]", n).dimmed(),
                mark,
                d.severity,
                d.confidence
            );
            println!("  {}", d.rationale);
            if let Some(target) = &d.rollback_target {
                println!("  rollback target: {}", target);
            }
        }
        StepOutcome::Generate(r) => {
            println!("{} generated {} artifact(s)", format!("[{}]", n).dimmed(), r.artifacts.len());
            for w in &r.warnings {
                println!("  {} {}: {}", "warning".yellow(), w.artifact_type, w.message);
            }
            for artifact in &r.artifacts {
                println!();
                print!("{}", renderer.render_artifact(artifact)?);
            }
        }
        StepOutcome::Rollback(r) => {
            println!("{} rollback -> {}", format!("[{}]", n).dimmed(), r.current_phase.cyan());
        }
        StepOutcome::Close(r) => {
            println!("{} closed [{}]", format!("[{}]", n).dimmed(), r.status);
        }
        StepOutcome::Status(r) => {
            print!("{} ", format!("[{}]", n).dimmed());
            print_session(r, "status");
        }
    }
    Ok(())
}

fn print_report(report: &CoverageReport) {
    println!(
        "  coverage {:.1}% (requirements {:.1}, constraints {:.1}, documentation {:.1}, testing {:.1})",
        report.overall, report.requirements, report.constraints, report.documentation, report.testing
    );
}

/// Validate and list constraints
fn cmd_constraints(config: &Config, file: Option<&Path>, format: OutputFormat) -> Result<()> {
    let registry = match file {
        Some(path) => ConstraintRegistry::from_file(path).context(format!("Invalid constraints in {}", path.display()))?,
        None => DesignEngine::from_config(config)
            .context("Failed to load configured constraints")?
            .registry()
            .clone(),
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "summary": registry.summary(),
                "constraints": registry.all(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            let summary = registry.summary();
            println!(
                "{} constraints ({} mandatory) in categories: {}",
                summary.accepted,
                summary.mandatory,
                summary.categories.join(", ")
            );
            println!();
            for c in registry.all() {
                let phases = if c.phases.is_empty() {
                    "all phases".to_string()
                } else {
                    c.phases.join(", ")
                };
                let flag = if c.mandatory { "mandatory".red() } else { "optional".normal() };
                println!("  {} [{}] {}", c.id.bold(), c.category, flag);
                println!("    {}", c.description);
                println!("    applies to: {}", phases);
            }
        }
    }
    Ok(())
}

/// Recommend a methodology
fn cmd_methodology(signals: &ProjectSignals, format: OutputFormat) -> Result<()> {
    let selection = select(signals);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&selection)?),
        OutputFormat::Text => {
            println!("Signals: {}", signals.describe());
            println!("Methodology: {}", selection.methodology.to_string().bold());
            println!("Rationale: {}", selection.rationale);
            match &selection.rule {
                Some(rule) => println!("Matched rule: {}", rule),
                None => println!("Matched rule: {}", "none (fallback)".yellow()),
            }
            println!();
            println!("Practices:");
            for practice in selection.methodology.practices() {
                println!("  - {}", practice);
            }
        }
    }
    Ok(())
}

/// Show the configured phase sequence
fn cmd_phases(config: &Config) -> Result<()> {
    let engine = DesignEngine::from_config(config).context("Failed to build design engine")?;
    println!("Coverage threshold: {:.1}%", config.workflow.coverage_threshold);
    println!();
    for (i, phase) in engine.phases().iter().enumerate() {
        println!("  {}. {}", i + 1, phase);
    }
    Ok(())
}
