//! PoolPro - conservative pool water treatment plans
//!
//! CLI entry point for the HTTP API and one-shot calculations.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;
use eyre::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use poolpro::cli::{Cli, Command, OutputFormat, format_dosing, format_outcome};
use poolpro::config::Config;
use poolpro::dosing::{self, DosingRequest};
use poolpro::plan::{DiagnoseRequest, PlanOrchestrator, plan_schema};
use poolpro::server::{self, AppState};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("poolpro")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("poolpro.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Serve { port } => {
            debug!(?port, "main: matched Serve command");
            cmd_serve(&config, port).await
        }
        Command::Dose { file, format } => {
            debug!(?file, %format, "main: matched Dose command");
            cmd_dose(file.as_deref(), format)
        }
        Command::Diagnose { file, offline, format } => {
            debug!(?file, offline, %format, "main: matched Diagnose command");
            cmd_diagnose(&config, file.as_deref(), offline, format).await
        }
        Command::Schema => {
            debug!("main: matched Schema command");
            print_json(&plan_schema())
        }
    }
}

/// Read a JSON request from a file, or stdin when no file is given
fn read_request<T: DeserializeOwned>(file: Option<&Path>) -> Result<T> {
    debug!(?file, "read_request: called");
    let content = match file {
        Some(path) => fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };
    serde_json::from_str(&content).context("Invalid JSON request")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_orchestrator(config: &Config) -> Result<PlanOrchestrator> {
    let resolved = config.llm.resolve();
    if !resolved.has_api_key() {
        warn!(
            "{} is not set; diagnose endpoint will use fallback mode",
            resolved.api_key_env
        );
    }
    let orchestrator = PlanOrchestrator::from_config(&resolved).context("Failed to configure LLM plan source")?;
    info!(
        external_source = orchestrator.has_external_source(),
        "Plan orchestrator ready"
    );
    Ok(orchestrator)
}

async fn cmd_serve(config: &Config, port: Option<u16>) -> Result<()> {
    debug!(?port, "cmd_serve: called");
    let port = port.unwrap_or_else(|| config.server.resolve_port());
    let state = AppState::new(build_orchestrator(config)?);
    println!("PoolPro listening on http://{}:{}", config.server.bind, port);
    server::run(state, &config.server.bind, port, config.server.body_limit_bytes).await
}

fn cmd_dose(file: Option<&Path>, format: OutputFormat) -> Result<()> {
    debug!(?file, %format, "cmd_dose: called");
    let request: DosingRequest = read_request(file)?;
    let result = dosing::calculate(&request);
    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Text => {
            print!("{}", format_dosing(&result));
            Ok(())
        }
    }
}

async fn cmd_diagnose(config: &Config, file: Option<&Path>, offline: bool, format: OutputFormat) -> Result<()> {
    debug!(?file, offline, %format, "cmd_diagnose: called");
    let request: DiagnoseRequest = read_request(file)?;
    let orchestrator = if offline {
        debug!("cmd_diagnose: offline, fallback only");
        PlanOrchestrator::fallback_only()
    } else {
        build_orchestrator(config)?
    };

    let outcome = orchestrator.produce(&request).await.context("Invalid diagnose request")?;
    match format {
        OutputFormat::Json => print_json(&outcome),
        OutputFormat::Text => {
            print!("{}", format_outcome(&outcome));
            Ok(())
        }
    }
}
