//! Mission Demo
//!
//! Runs a scripted set of commands through the full pipeline (planner ->
//! tools -> drivers) with everything mocked, printing the event stream as
//! it happens. No network or hardware needed.

use abort_signal::InterruptSignal;
use command_engine::{forward_state_changes, CommandEngine, CommandEvent, EventBus};
use drone_drivers::{DroneController, MockMotion, MockVision, SafetyLimits};
use drone_tools::{register_default_tools, ToolRegistry};
use mission_planner::{MockPlanner, PlannerResponse, ToolCall};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("🚁 Drone Mission Demo");
    println!("=====================");

    let planner = MockPlanner::with_responses(vec![
        PlannerResponse::with_calls(
            "Taking off and flying a short out-and-back.",
            vec![
                ToolCall::new("takeoff"),
                ToolCall::new("move")
                    .with_arg("direction", "forward")
                    .with_arg("distance", 80),
                ToolCall::new("rotate").with_arg("degrees", 180),
                ToolCall::new("get_status"),
            ],
        ),
        PlannerResponse::with_calls(
            "Scanning for the red backpack.",
            vec![ToolCall::new("search")
                .with_arg("target", "red backpack")
                .with_arg("rotation_step", 45)],
        ),
        PlannerResponse::with_calls(
            "Stopping immediately.",
            vec![
                ToolCall::new("emergency_stop"),
                ToolCall::new("move")
                    .with_arg("direction", "forward")
                    .with_arg("distance", 100),
            ],
        ),
        PlannerResponse::with_calls(
            "Resuming and heading home.",
            vec![ToolCall::new("hover"), ToolCall::new("return_home")],
        ),
    ]);

    let signal = InterruptSignal::new();
    let controller = Arc::new(
        DroneController::new(
            Box::new(MockMotion::new()),
            Box::new(MockVision::match_on_capture(3)),
            signal.clone(),
            SafetyLimits::default(),
        )
        .with_search_pause(0.05),
    );

    let mut registry = ToolRegistry::new();
    register_default_tools(&mut registry, controller.clone(), signal.clone())?;
    println!("✅ {} tools registered", registry.len());

    let events = EventBus::new();
    forward_state_changes(controller.state_machine(), events.clone());
    let engine = CommandEngine::new(Arc::new(planner), Arc::new(registry), signal, events);

    let mut rx = engine.events().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            print_event(&event);
        }
    });

    // The abort flag raised by the emergency stop persists until the
    // operator clears it, so the last command clears it first.
    let commands = [
        ("take off and fly forward, then turn around", false),
        ("look for the red backpack", false),
        ("stop! stop everything!", false),
        ("ok, come back home", true),
    ];
    for (command, clear_abort_first) in commands {
        if clear_abort_first {
            println!("\n🔓 operator clears the abort flag");
            engine.clear_abort();
        }
        println!("\n🎙️  \"{command}\"");
        println!("------------------------------");
        let execution = engine.submit_command(command).await?;
        let (ok, failed) = execution.counts();
        println!("   => {:?} ({ok} ok, {failed} failed)", execution.status);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    println!("\n📊 Final status:");
    let status = controller.status();
    println!("   state:    {}", status.state);
    println!("   battery:  {}%", status.battery_pct);
    println!("   height:   {}cm", status.height_cm);
    println!("   home off: {:.0}cm", status.distance_from_home_cm);

    printer.abort();
    println!("\n🎉 Demo complete");
    Ok(())
}

fn print_event(event: &CommandEvent) {
    match event {
        CommandEvent::CommandReceived { .. } => {}
        CommandEvent::AiResponse { text, tool_calls, .. } => {
            println!("   🤖 {text} ({} tool calls)", tool_calls.len());
        }
        CommandEvent::ToolStart { tool, index, total, .. } => {
            println!("   [{index}/{total}] {tool}...");
        }
        CommandEvent::ToolComplete {
            tool,
            success,
            message,
            ..
        } => {
            let mark = if *success { "✅" } else { "❌" };
            println!("       {mark} {tool}: {message}");
        }
        CommandEvent::Found { target, .. } => {
            println!("   🔎 found the {target}!");
        }
        CommandEvent::StateChanged { from, to } => {
            println!("       ✈️  {from} -> {to}");
        }
        CommandEvent::Error { message, .. } => {
            println!("   ⚠️  {message}");
        }
        CommandEvent::Done { .. } => {}
    }
}
