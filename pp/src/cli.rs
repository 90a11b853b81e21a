//! CLI command definitions and text rendering

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fmt::Write;
use std::path::PathBuf;
use tracing::debug;

use crate::dosing::DosingResult;
use crate::plan::DiagnoseOutcome;

/// PoolPro - conservative pool water treatment plans
#[derive(Parser)]
#[command(
    name = "pp",
    about = "Conservative pool chemistry dosing and treatment plans",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides config and POOLPRO_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Calculate doses for a dosing request
    Dose {
        /// JSON request file (stdin if omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Produce a treatment plan for a diagnose request
    Diagnose {
        /// JSON request file (stdin if omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Never call the LLM; always use the fallback plan
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Print the plan JSON schema
    Schema,
}

/// Output format for dose/diagnose
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "plain" => Ok(Self::Text),
            _ => {
                debug!("OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: json or text", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
        }
    }
}

fn bullets(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}", heading.bold());
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

/// Human-readable dosing result
pub fn format_dosing(result: &DosingResult) -> String {
    debug!(doses = result.doses.len(), "format_dosing: called");
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Confidence:".bold(), result.confidence);

    if result.doses.is_empty() {
        let _ = writeln!(out, "{}", "No doses recommended.".yellow());
    } else {
        let _ = writeln!(out, "{}", "Doses:".bold());
        for dose in &result.doses {
            let _ = writeln!(
                out,
                "  {} {} {} ({})",
                dose.chemical.cyan(),
                dose.amount,
                dose.unit,
                dose.notes
            );
        }
    }

    if !result.missing_fields.is_empty() {
        let _ = writeln!(out, "{} {}", "Missing:".red().bold(), result.missing_fields.join(", "));
    }
    bullets(&mut out, "Assumptions:", &result.assumptions);
    bullets(&mut out, "Safety:", &result.safety_notes);
    let _ = writeln!(out, "{} {} hours", "Retest in:".bold(), result.retest_in_hours);
    out
}

/// Human-readable diagnose outcome
pub fn format_outcome(outcome: &DiagnoseOutcome) -> String {
    debug!(source = %outcome.source, "format_outcome: called");
    let plan = &outcome.plan;
    let mut out = String::new();

    let _ = writeln!(out, "{} {}", "Diagnosis:".bold(), plan.diagnosis);
    let _ = writeln!(out, "{} {} ({})", "Confidence:".bold(), plan.confidence, outcome.source);
    if let Some(warning) = &outcome.warning {
        let _ = writeln!(out, "{} {}", "Warning:".yellow().bold(), warning);
    }

    let _ = writeln!(out, "{}", "Steps:".bold());
    for (i, step) in plan.steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, step);
    }

    if !plan.chemical_additions.is_empty() {
        let _ = writeln!(out, "{}", "Chemical additions:".bold());
        for a in &plan.chemical_additions {
            let _ = writeln!(
                out,
                "  {} {} {} - {}",
                a.chemical.cyan(),
                a.amount,
                a.unit,
                a.instructions
            );
        }
    }

    bullets(&mut out, "Safety:", &plan.safety_notes);
    bullets(&mut out, "Adjusted:", &outcome.safety_adjustments);
    let _ = writeln!(out, "{} {} hours", "Retest in:".bold(), plan.retest_in_hours);
    bullets(&mut out, "Call a pro if:", &plan.when_to_call_pro);
    out
}
