//! tandem - agentic workflow runner.
//!
//! Runs the entry of a project manifest: loads worker files and registered
//! modules, links them, and executes the entry with approval prompts on
//! the terminal.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod approval;
mod render;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

use tandem_approval::ApprovalMode;
use tandem_project::{ModuleRegistry, Project, link};
use tandem_runtime::{Runtime, RuntimeConfig, RuntimeError, WorkerInput};

use approval::TerminalApprovalHandler;
use render::event_renderer;

/// Exit code for user and configuration errors.
const EXIT_USER_ERROR: u8 = 1;
/// Exit code for execution errors.
const EXIT_EXECUTION_ERROR: u8 = 2;
/// Exit code when interrupted.
const EXIT_INTERRUPTED: u8 = 130;

/// tandem - run the entry of a project manifest.
#[derive(Debug, Parser)]
#[command(name = "tandem", version, about, long_about = None)]
struct Cli {
    /// Path to the project manifest (JSON).
    manifest: PathBuf,

    /// Prompt text for the entry. Only honored when the manifest sets
    /// `allow_cli_input`.
    prompt: Option<String>,

    /// Inline JSON input for the entry (conflicts with a positional prompt).
    #[arg(long)]
    input_json: Option<String>,

    /// Approval mode override.
    #[arg(long, value_enum)]
    approval_mode: Option<ApprovalModeArg>,

    /// Maximum call nesting depth override.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Model override for every worker.
    #[arg(long, env = "TANDEM_MODEL_OVERRIDE")]
    model: Option<String>,

    /// Verbosity: 0 quiet, 1 progress, 2 streaming deltas.
    #[arg(short, long)]
    verbosity: Option<u8>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ApprovalModeArg {
    Prompt,
    ApproveAll,
    RejectAll,
}

impl From<ApprovalModeArg> for ApprovalMode {
    fn from(value: ApprovalModeArg) -> Self {
        match value {
            ApprovalModeArg::Prompt => Self::Prompt,
            ApprovalModeArg::ApproveAll => Self::ApproveAll,
            ApprovalModeArg::RejectAll => Self::RejectAll,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tokio::select! {
        code = run(cli) => code,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

async fn run(cli: Cli) -> ExitCode {
    // The binary links built-ins only; embedding hosts register their own
    // modules and providers through the same library surface.
    let modules = ModuleRegistry::new();

    let project = match link(&cli.manifest, &modules) {
        Ok(project) => project,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::from(EXIT_USER_ERROR);
        }
    };

    let input = match resolve_input(&cli, &project) {
        Ok(input) => input,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(EXIT_USER_ERROR);
        }
    };

    let config = build_config(&cli, &project);
    debug!(?config, "runtime configuration assembled");
    let runtime = Runtime::new(config, Arc::clone(&project.resolver));

    match runtime.run_to_completion(&project.entry, input).await {
        Ok(output) => {
            match output {
                serde_json::Value::String(text) => println!("{text}"),
                other => println!("{other}"),
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error}");
            let code = match &error {
                RuntimeError::InputValidation { .. } => EXIT_USER_ERROR,
                _ => EXIT_EXECUTION_ERROR,
            };
            ExitCode::from(code)
        }
    }
}

/// Resolve the entry input from, in order of precedence: `--input-json`,
/// the positional prompt (if allowed), the manifest's `entry.input`.
fn resolve_input(cli: &Cli, project: &Project) -> Result<WorkerInput, String> {
    if cli.prompt.is_some() && cli.input_json.is_some() {
        return Err("a positional prompt conflicts with --input-json; pass one or the other".into());
    }

    if let Some(raw) = &cli.input_json {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| format!("invalid --input-json: {e}"))?;
        return WorkerInput::new(Arc::clone(project.entry.input_model()), value)
            .map_err(|e| e.to_string());
    }

    if let Some(prompt) = &cli.prompt {
        if !project.manifest.allow_cli_input {
            return Err(
                "this manifest does not allow CLI input (set allow_cli_input to true)".into(),
            );
        }
        return Ok(WorkerInput::from_prompt(prompt.clone()));
    }

    if let Some(value) = &project.manifest.entry.input {
        return WorkerInput::new(Arc::clone(project.entry.input_model()), value.clone())
            .map_err(|e| e.to_string());
    }

    Err("no input: pass a prompt, --input-json, or set entry.input in the manifest".into())
}

/// Assemble the runtime configuration: defaults, then manifest, then flags.
fn build_config(cli: &Cli, project: &Project) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    project.manifest.runtime.apply(&mut config);

    if let Some(mode) = cli.approval_mode {
        config.approval.mode = mode.into();
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(verbosity) = cli.verbosity {
        config.verbosity = verbosity;
    }
    config.model_override = cli.model.clone();

    config.project_root = cli
        .manifest
        .parent()
        .map_or_else(|| PathBuf::from("."), std::path::Path::to_path_buf);

    if config.approval.mode == ApprovalMode::Prompt {
        config.approval.handler = Some(Arc::new(TerminalApprovalHandler::new()));
    }
    config.on_event = Some(event_renderer(config.verbosity));
    config
}
