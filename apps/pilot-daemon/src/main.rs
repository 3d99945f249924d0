//! Interactive natural-language drone pilot.
//!
//! Reads commands from stdin, plans them with a language model (or the
//! offline mock planner), flies them against the mock drivers, and prints
//! the streamed progress events. Ctrl-C aborts the command in flight.

use abort_signal::InterruptSignal;
use anyhow::Result;
use clap::Parser;
use command_engine::{forward_state_changes, CommandEngine, CommandEvent, EventBus};
use drone_drivers::{DroneController, MockMotion, MockVision, SafetyLimits};
use drone_tools::{register_default_tools, ToolRegistry};
use mission_planner::{MockPlanner, OpenAiPlanner, Planner, PlannerConfig};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are the pilot of a small indoor drone. \
Translate the operator's request into tool calls, using as few as possible. \
Distances are in centimeters, rotations in degrees. If a request is unsafe \
or impossible, say so instead of calling tools.";

#[derive(Parser)]
#[command(name = "pilot-daemon")]
#[command(about = "Natural-language drone command interpreter")]
struct Args {
    /// Planner backend: "openai" for a live model, "mock" for offline runs
    #[arg(long, default_value = "openai")]
    planner: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, default_value = "https://api.x.ai/v1")]
    api_base: String,

    /// Model name
    #[arg(long, default_value = "grok-3-fast")]
    model: String,

    /// API key; falls back to the XAI_API_KEY environment variable
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let args = Args::parse();

    info!("pilot-daemon starting");

    let signal = InterruptSignal::new();
    let controller = Arc::new(DroneController::new(
        Box::new(MockMotion::new()),
        Box::new(MockVision::never()),
        signal.clone(),
        SafetyLimits::default(),
    ));

    let mut registry = ToolRegistry::new();
    register_default_tools(&mut registry, controller.clone(), signal.clone())
        .map_err(|e| anyhow::anyhow!("tool registration failed: {e}"))?;
    info!(tools = registry.len(), "tool registry ready");

    let planner = build_planner(&args)?;
    let events = EventBus::new();
    forward_state_changes(controller.state_machine(), events.clone());

    let engine = Arc::new(CommandEngine::new(
        planner,
        Arc::new(registry),
        signal.clone(),
        events,
    ));

    spawn_event_printer(&engine);
    spawn_abort_handler(engine.clone());

    println!(
        "Type a command ('quit' to exit). Ctrl-C aborts the current command; \
         'clear' resets the abort flag."
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if line == "clear" {
            engine.clear_abort();
            println!("abort flag cleared");
            continue;
        }
        if let Err(e) = engine.submit_command(line).await {
            warn!(error = %e, "command rejected");
            println!("rejected: {e}");
        }
    }

    info!("pilot-daemon shutting down");
    Ok(())
}

fn build_planner(args: &Args) -> Result<Arc<dyn Planner>> {
    match args.planner.as_str() {
        "mock" => {
            info!("using offline mock planner");
            Ok(Arc::new(MockPlanner::new()))
        }
        "openai" => {
            let api_key = match &args.api_key {
                Some(key) => key.clone(),
                None => std::env::var("XAI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("no API key: pass --api-key or set XAI_API_KEY"))?,
            };
            let config = PlannerConfig {
                api_base: args.api_base.clone(),
                api_key,
                model: args.model.clone(),
                system_prompt: Some(SYSTEM_PROMPT.to_string()),
                ..PlannerConfig::default()
            };
            info!(api_base = %config.api_base, model = %config.model, "using chat-completions planner");
            Ok(Arc::new(OpenAiPlanner::new(config)?))
        }
        other => Err(anyhow::anyhow!("unknown planner backend: {other}")),
    }
}

fn spawn_event_printer(engine: &Arc<CommandEngine>) {
    let mut rx = engine.events().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match &*event {
                CommandEvent::CommandReceived { text, .. } => {
                    println!("▶ {text}");
                }
                CommandEvent::AiResponse { text, tool_calls, .. } => {
                    println!("🤖 {text} ({} tool calls)", tool_calls.len());
                }
                CommandEvent::ToolStart { tool, index, total, .. } => {
                    println!("  [{index}/{total}] {tool}...");
                }
                CommandEvent::ToolComplete {
                    tool,
                    index,
                    success,
                    message,
                    ..
                } => {
                    let mark = if *success { "✅" } else { "❌" };
                    println!("  [{index}] {mark} {tool}: {message}");
                }
                CommandEvent::Found { target, .. } => {
                    println!("🔎 found: {target}");
                }
                CommandEvent::StateChanged { from, to } => {
                    println!("  state: {from} -> {to}");
                }
                CommandEvent::Error { message, .. } => {
                    println!("⚠️  {message}");
                }
                CommandEvent::Done {
                    status,
                    succeeded,
                    failed,
                    ..
                } => {
                    println!("∎ done ({status:?}): {succeeded} ok, {failed} failed");
                }
            }
        }
    });
}

fn spawn_abort_handler(engine: Arc<CommandEngine>) {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            warn!("ctrl-c received, aborting current command");
            engine.trigger_abort();
        }
    });
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
