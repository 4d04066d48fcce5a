//! # warden-cli
//!
//! Operator CLI that runs the bundled demo scenarios against the real
//! orchestration core and prints the terminal result bundle.

mod fakes;
mod scenario_file;
mod scenarios;

use clap::{Parser, Subcommand};
use tracing::{info, Level};

use scenarios::SCENARIOS;
use warden_core::scheduler::RunResult;
use warden_core::task::TaskStatus;

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Run bundled multi-agent orchestration demo scenarios", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug-level logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the bundled demo scenarios
    List,
    /// Run one demo scenario and print its terminal result bundle
    Run {
        /// Scenario name, as shown by `warden list`
        scenario: String,
    },
    /// Run every bundled demo scenario in sequence
    RunAll,
    /// Run a task graph loaded from an operator-supplied JSON file
    RunFile {
        /// Path to a scenario file (see `scenario_file::ScenarioFile`)
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let verbose = cli.verbose
        || warden_tooling::config::get_env_bool("WARDEN_VERBOSE")?.unwrap_or(false);
    let level = if verbose {
        Level::DEBUG
    } else {
        match warden_tooling::config::get_env_or("WARDEN_LOG_LEVEL", "info")?.parse() {
            Ok(level) => level,
            Err(_) => Level::INFO,
        }
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command.unwrap_or(Command::RunAll) {
        Command::List => list_scenarios(),
        Command::Run { scenario } => {
            let result = scenarios::run_scenario(&scenario).await?;
            print_result(&scenario, &result);
        }
        Command::RunAll => {
            for scenario in SCENARIOS {
                let result = scenarios::run_scenario(scenario.name).await?;
                print_result(scenario.name, &result);
            }
        }
        Command::RunFile { path } => {
            let result = scenario_file::run_scenario_file(&path).await?;
            print_result(&path, &result);
        }
    }

    Ok(())
}

fn list_scenarios() {
    println!("Bundled demo scenarios:");
    for scenario in SCENARIOS {
        println!("  {:<24} {}", scenario.name, scenario.description);
    }
}

fn print_result(scenario: &str, result: &RunResult) {
    info!(scenario, "scenario complete");
    println!("\n=== {scenario} ===");
    let mut ids: Vec<_> = result.task_states.keys().collect();
    ids.sort();
    for id in ids {
        println!("  {id}: {:?}", result.task_states[id]);
    }
    let succeeded = result.task_states.values().filter(|s| **s == TaskStatus::Success).count();
    println!(
        "  sealed checkpoints: {} | succeeded: {succeeded} | confidence(min/mean): {:.4}/{:.4}",
        result.sealed_checkpoints.len(),
        result.confidence_stats.min,
        result.confidence_stats.mean,
    );
    if !result.guardrail_activations.is_empty() {
        println!("  guardrails:");
        for (task_id, kind) in &result.guardrail_activations {
            println!("    {task_id}: {kind:?}");
        }
    }
    if let Some(checkpoint) = &result.last_good_checkpoint {
        println!("  last good checkpoint: {checkpoint}");
    }
}
