//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// designflow - Design Session Orchestration Engine
#[derive(Parser)]
#[command(
    name = "designflow",
    about = "Phase-gated design sessions with coverage scoring, pivots and decision records",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/designflow/logs/designflow.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Run a scripted design session from a YAML scenario
    Run {
        /// Scenario file
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate and list a constraint configuration
    Constraints {
        /// Constraint file; the configured or builtin set when omitted
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Recommend a methodology from project signals
    Methodology {
        /// greenfield or brownfield
        #[arg(long)]
        project_type: Option<String>,

        /// exploratory or well-defined
        #[arg(long)]
        problem_framing: Option<String>,

        /// small, medium or large
        #[arg(long)]
        team_size: Option<String>,

        /// flexible or fixed
        #[arg(long)]
        timeline: Option<String>,

        /// low or high
        #[arg(long)]
        risk_tolerance: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the configured phase sequence
    Phases,
}

/// Output format for command results
#[derive(Clone, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["designflow"]);
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["designflow", "run", "session.yml"]);
        match cli.command {
            Some(Command::Run { scenario, format }) => {
                assert_eq!(scenario, PathBuf::from("session.yml"));
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_json() {
        let cli = Cli::parse_from(["designflow", "run", "session.yml", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Some(Command::Run {
                format: OutputFormat::Json,
                ..
            })
        ));
    }

    #[test]
    fn test_cli_parse_constraints_default() {
        let cli = Cli::parse_from(["designflow", "constraints"]);
        assert!(matches!(cli.command, Some(Command::Constraints { file: None, .. })));
    }

    #[test]
    fn test_cli_parse_methodology() {
        let cli = Cli::parse_from([
            "designflow",
            "methodology",
            "--project-type",
            "greenfield",
            "--risk-tolerance",
            "high",
        ]);
        match cli.command {
            Some(Command::Methodology {
                project_type,
                risk_tolerance,
                team_size,
                ..
            }) => {
                assert_eq!(project_type.as_deref(), Some("greenfield"));
                assert_eq!(risk_tolerance.as_deref(), Some("high"));
                assert!(team_size.is_none());
            }
            _ => panic!("Expected Methodology command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from(["designflow", "phases", "-v", "--config", "custom.yml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yml")));
        assert!(matches!(cli.command, Some(Command::Phases)));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
