//! Command-line front end.
//!
//! ```bash
//! # One goal, then exit (0 = done, 2 = turn budget exhausted, 1 = error)
//! dind-agent --goal "Build the image in ./app and run its tests"
//!
//! # Interactive: each line starts a fresh session
//! dind-agent --workspace /workdir --max-turns 20
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use dind_agent::config;
use dind_agent::logging::{self, LoggingConfig};
use dind_agent::prelude::*;
use dind_agent::transcript::{render_call, render_result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use termimad::MadSkin;

/// Lines of tool output shown on the terminal; the model always sees all of it.
const PREVIEW_LINES: usize = 40;

/// Pursue a goal with shell, file and web tools inside this container.
#[derive(Parser, Debug)]
#[command(name = "dind-agent", version, about)]
struct Args {
    /// Goal to pursue. Without it, starts an interactive prompt.
    #[arg(short, long)]
    goal: Option<String>,

    /// Configuration file. Defaults to ./dind-agent.toml, then
    /// ~/.config/dind-agent/config.toml.
    #[arg(short, long, env = "DIND_AGENT_CONFIG")]
    config: Option<PathBuf>,

    /// Workspace root named in the system prompt.
    #[arg(short, long, env = "DIND_AGENT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Model to use.
    #[arg(short, long)]
    model: Option<String>,

    /// Completion round trips allowed per session.
    #[arg(long)]
    max_turns: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => config::from_path(path)?,
        None => config::load()?,
    };
    if let Some(ref workspace) = args.workspace {
        config.workspace_root = workspace.clone();
    }
    if let Some(ref model) = args.model {
        config.provider.model = model.clone();
    }
    if let Some(max_turns) = args.max_turns {
        config.max_turns = max_turns;
    }
    config.validate()?;

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("warning: {e}");
    }

    let agent = build_agent(&config)?;
    tracing::info!(
        workspace = %config.workspace_root.display(),
        model = %config.provider.model,
        max_turns = config.max_turns,
        "Agent ready"
    );

    let skin = MadSkin::default();
    if let Some(ref goal) = args.goal {
        let outcome = run_session(&agent, &config, goal, &skin).await?;
        return Ok(exit_code(&outcome));
    }

    run_repl(&agent, &config, &skin).await?;
    Ok(ExitCode::SUCCESS)
}

/// Wires the client, shim, search provider and registry together.
///
/// Fails before any session starts if the API key is missing.
fn build_agent(config: &DindConfig) -> Result<Agent, DindError> {
    let client = OpenAIClient::new(config.provider_config()?)?;
    let shim = Arc::new(ExecutionShim::new(config.shim_config()));
    let registry = builtin_registry(shim, config.search_provider()?);
    Ok(Agent::new(
        Arc::new(client),
        Arc::new(registry),
        config.agent_config(),
    ))
}

async fn run_repl(agent: &Agent, config: &DindConfig, skin: &MadSkin) -> Result<()> {
    println!("dind-agent {}", env!("CARGO_PKG_VERSION"));
    println!("Model: {}", config.provider.model);
    println!("Workspace: {}", config.workspace_root.display());
    println!("Each line starts a new session. Ctrl-C cancels a running session, Ctrl-D quits.\n");

    let mut line_editor = Reedline::create();
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("goal".to_string()),
        DefaultPromptSegment::Empty,
    );

    loop {
        match line_editor.read_line(&prompt).context("reading input")? {
            Signal::Success(line) => {
                let goal = line.trim();
                if goal.is_empty() {
                    continue;
                }
                if matches!(goal, "/quit" | "/exit" | "/q") {
                    break;
                }
                run_session(agent, config, goal, skin).await?;
                println!();
            }
            Signal::CtrlC => continue,
            Signal::CtrlD => break,
            _ => continue,
        }
    }

    Ok(())
}

/// Runs one session, streaming its progress to the terminal.
async fn run_session(
    agent: &Agent,
    config: &DindConfig,
    goal: &str,
    skin: &MadSkin,
) -> Result<SessionOutcome> {
    let mut handle = agent.start_session(goal);
    let canceller = handle.canceller();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut pending_text: Option<String> = None;
    let outcome = loop {
        let event = tokio::select! {
            event = handle.next() => event,
            _ = tokio::signal::ctrl_c() => {
                spinner.set_message("Cancelling...");
                canceller.cancel();
                continue;
            }
        };

        match event {
            Some(SessionEvent::TurnStarted { turn }) => {
                spinner.set_message(format!("Waiting for the model (turn {turn})"));
            }
            Some(SessionEvent::AssistantText { text, .. }) => pending_text = Some(text),
            Some(SessionEvent::ToolCallStarted(call)) => {
                spinner.suspend(|| {
                    if let Some(text) = pending_text.take() {
                        skin.print_text(&text);
                    }
                    skin.print_text(&render_call(&call));
                });
                spinner.set_message(format!("Running {}", call.name));
            }
            Some(SessionEvent::ToolCallFinished(result)) => {
                spinner.suspend(|| skin.print_text(&render_result(&preview(result))));
            }
            Some(SessionEvent::Finished(outcome)) => break *outcome,
            None => anyhow::bail!("session task ended without an outcome"),
        }
    };
    spinner.finish_and_clear();

    match &outcome.status {
        SessionStatus::Done { answer } => skin.print_text(answer),
        SessionStatus::Failed { reason } => {
            if let Some(text) = pending_text {
                skin.print_text(&text);
            }
            eprintln!("\n{reason}");
            if !matches!(reason, FailureReason::Cancelled) {
                dump_transcript(&outcome, &config.logging);
            }
        }
    }

    Ok(outcome)
}

/// Shortens a result's output for display.
fn preview(mut result: ToolResult) -> ToolResult {
    let total = result.output.lines().count();
    if total > PREVIEW_LINES {
        let head: Vec<&str> = result.output.lines().take(PREVIEW_LINES).collect();
        result.output = format!(
            "{}\n... ({} more lines)",
            head.join("\n"),
            total - PREVIEW_LINES
        );
    }
    result
}

/// Writes a failed session's transcript next to the logs.
fn dump_transcript(outcome: &SessionOutcome, logging_config: &LoggingConfig) {
    let written = logging::log_dir(logging_config)
        .map_err(DindError::from)
        .and_then(|dir| {
            let path = dir.join(format!("{}.json", outcome.session_id));
            let json = outcome
                .transcript
                .to_json()
                .map_err(|e| DindError::io(&path, e.to_string()))?;
            std::fs::create_dir_all(&dir).map_err(|e| DindError::io(&dir, e.to_string()))?;
            std::fs::write(&path, json).map_err(|e| DindError::io(&path, e.to_string()))?;
            Ok(path)
        });

    match written {
        Ok(path) => eprintln!("Transcript written to {}", path.display()),
        Err(e) => tracing::warn!(error = %e, "Could not write transcript"),
    }
}

fn exit_code(outcome: &SessionOutcome) -> ExitCode {
    match outcome.failure() {
        None => ExitCode::SUCCESS,
        Some(reason) if reason.is_budget_exceeded() => ExitCode::from(2),
        Some(_) => ExitCode::FAILURE,
    }
}
