//! Loads a task graph from an operator-supplied JSON file, for driving the
//! orchestration core against something other than the six bundled demos.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use serde::Deserialize;

use warden_core::options::RunOptions;
use warden_core::run;
use warden_core::scheduler::{RunResult, TaskAgents};
use warden_core::task::{AgentRole, TaskNode};
use warden_tooling::error::ErrorContext;

use crate::fakes::EchoAgent;

#[derive(Deserialize)]
struct ScenarioFile {
    #[serde(default = "default_run_id")]
    run_id: String,
    tasks: Vec<TaskSpec>,
}

fn default_run_id() -> String {
    "from-file".to_string()
}

#[derive(Deserialize)]
struct TaskSpec {
    id: String,
    role: AgentRole,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    high_stakes: bool,
    #[serde(default = "default_max_retries")]
    max_retries: u32,
    #[serde(default = "default_op_confidence")]
    op_confidence: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_op_confidence() -> f64 {
    0.9
}

/// Read and parse `path`. File-not-found and malformed-JSON are both
/// reachable from an operator's own scenario file, so both are wrapped with
/// a description of which step failed before bubbling up the underlying
/// `io::Error`/`serde_json::Error`.
fn load_scenario_file(path: &str) -> Result<ScenarioFile, Box<dyn std::error::Error + Send + Sync>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading scenario file '{path}'"))?;
    let scenario: ScenarioFile = serde_json::from_str(&raw)
        .with_context(|| format!("parsing scenario file '{path}' as JSON"))?;
    Ok(scenario)
}

/// Build task nodes and deterministic `EchoAgent` bindings from `path` and
/// run them through the real `submit`/`run` surface.
pub async fn run_scenario_file(path: &str) -> anyhow::Result<RunResult> {
    let scenario = load_scenario_file(path)
        .map_err(|e| anyhow::anyhow!("{}", warden_tooling::error::format_error_chain(&*e)))?;

    if scenario.tasks.is_empty() {
        anyhow::bail!("scenario file '{path}' declares no tasks");
    }

    let mut nodes = Vec::with_capacity(scenario.tasks.len());
    let mut agents = HashMap::new();
    for spec in &scenario.tasks {
        let node = TaskNode::new(&spec.id, spec.role)
            .with_dependencies(spec.dependencies.clone())
            .with_max_retries(spec.max_retries)
            .with_high_stakes(spec.high_stakes);
        nodes.push(node);
        agents.insert(
            spec.id.clone(),
            TaskAgents::new(Arc::new(EchoAgent::new(format!("agent-{}", spec.id), spec.op_confidence))),
        );
    }

    let handle = run::submit(scenario.run_id, nodes, HashMap::new(), agents, RunOptions::default())?;
    Ok(run::run(&handle).await?)
}
