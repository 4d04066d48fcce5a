//! The six bundled demo scenarios, run against the real
//! scheduler through the public `submit`/`run` surface — the same path a
//! real caller exercises, just with deterministic in-process agents.

use std::collections::HashMap;
use std::sync::Arc;

use warden_core::options::RunOptions;
use warden_core::payload::AgentPayload;
use warden_core::run::{self, RunHandle};
use warden_core::scheduler::{RunResult, TaskAgents};
use warden_core::task::{AgentRole, ParallelizationHint, TaskNode};

use crate::fakes::{AlwaysFailsAgent, EchoAgent, NullAdversary, TamperingAgent};

pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario { name: "linear-chain", description: "three generators in sequence, all succeeding" },
    Scenario { name: "fork-join", description: "[A] -> [B, C] -> [D]" },
    Scenario { name: "integrity-violation", description: "an agent returns a tampered payload" },
    Scenario { name: "breaker-opens", description: "5 consecutive failures trip the circuit breaker" },
    Scenario { name: "sycophantic-adversary", description: "a parroting adversary on a high-stakes task" },
    Scenario { name: "expired-checkpoint", description: "a zero-TTL checkpoint forces a severed chain link" },
];

pub async fn run_scenario(name: &str) -> anyhow::Result<RunResult> {
    let result = match name {
        "linear-chain" => linear_chain().await?,
        "fork-join" => fork_join().await?,
        "integrity-violation" => integrity_violation().await?,
        "breaker-opens" => breaker_opens().await?,
        "sycophantic-adversary" => sycophantic_adversary().await?,
        "expired-checkpoint" => expired_checkpoint().await?,
        other => anyhow::bail!("unknown scenario '{other}'; run `warden list` to see available scenarios"),
    };
    Ok(result)
}

async fn submit_and_run(
    run_id: &str,
    nodes: Vec<TaskNode>,
    initial: HashMap<String, AgentPayload>,
    agents: HashMap<String, TaskAgents>,
    options: RunOptions,
) -> anyhow::Result<RunResult> {
    let handle: RunHandle = run::submit(run_id, nodes, initial, agents, options)?;
    Ok(run::run(&handle).await?)
}

async fn linear_chain() -> anyhow::Result<RunResult> {
    let nodes = vec![
        TaskNode::new("t1", AgentRole::Generator),
        TaskNode::new("t2", AgentRole::Generator).with_dependencies(vec!["t1".into()]),
        TaskNode::new("t3", AgentRole::Generator).with_dependencies(vec!["t2".into()]),
    ];
    let mut agents = HashMap::new();
    for id in ["t1", "t2", "t3"] {
        agents.insert(id.to_string(), TaskAgents::new(Arc::new(EchoAgent::new(format!("agent-{id}"), 0.95))));
    }
    let mut initial = HashMap::new();
    initial.insert(
        "t1".to_string(),
        AgentPayload::seal("seed", "seed-agent", serde_json::json!({"seed": true}), 1.0, vec![], "seed", true)?,
    );
    submit_and_run("linear-chain", nodes, initial, agents, RunOptions::default()).await
}

async fn fork_join() -> anyhow::Result<RunResult> {
    let nodes = vec![
        TaskNode::new("a", AgentRole::Generator),
        TaskNode::new("b", AgentRole::Generator).with_dependencies(vec!["a".into()]),
        TaskNode::new("c", AgentRole::Generator).with_dependencies(vec!["a".into()]),
        TaskNode::new("d", AgentRole::Generator).with_dependencies(vec!["b".into(), "c".into()]),
    ];
    let mut agents = HashMap::new();
    for id in ["a", "b", "c", "d"] {
        agents.insert(id.to_string(), TaskAgents::new(Arc::new(EchoAgent::new(format!("agent-{id}"), 0.9))));
    }
    submit_and_run("fork-join", nodes, HashMap::new(), agents, RunOptions::default()).await
}

async fn integrity_violation() -> anyhow::Result<RunResult> {
    let nodes = vec![
        TaskNode::new("t1", AgentRole::Generator),
        TaskNode::new("t2", AgentRole::Generator).with_dependencies(vec!["t1".into()]),
    ];
    let mut agents = HashMap::new();
    agents.insert("t1".to_string(), TaskAgents::new(Arc::new(TamperingAgent { id: "agent-t1".into() })));
    agents.insert("t2".to_string(), TaskAgents::new(Arc::new(EchoAgent::new("agent-t2", 0.9))));
    submit_and_run("integrity-violation", nodes, HashMap::new(), agents, RunOptions::default()).await
}

async fn breaker_opens() -> anyhow::Result<RunResult> {
    let shared_agent_id = "shared-flaky-agent";
    let mut nodes = Vec::new();
    let mut agents = HashMap::new();
    for i in 0..6 {
        let id = format!("t{i}");
        nodes.push(
            TaskNode::new(&id, AgentRole::Worker)
                .with_parallelization(ParallelizationHint::SerialRequired)
                .with_max_retries(0),
        );
        agents.insert(id, TaskAgents::new(Arc::new(AlwaysFailsAgent { id: shared_agent_id.into() })));
    }
    let options = RunOptions::default().with_backoff_schedule_secs(vec![0]).with_fan_out_limit(1);
    submit_and_run("breaker-opens", nodes, HashMap::new(), agents, options).await
}

async fn sycophantic_adversary() -> anyhow::Result<RunResult> {
    let nodes = vec![TaskNode::new("t1", AgentRole::Generator).with_high_stakes(true)];
    let mut agents = HashMap::new();
    agents.insert(
        "t1".to_string(),
        TaskAgents::new(Arc::new(EchoAgent::new("agent-primary", 0.9)))
            .with_adversary(Arc::new(NullAdversary { id: "agent-adversary".into() })),
    );
    submit_and_run("sycophantic-adversary", nodes, HashMap::new(), agents, RunOptions::default()).await
}

async fn expired_checkpoint() -> anyhow::Result<RunResult> {
    let nodes = vec![
        TaskNode::new("t1", AgentRole::Generator),
        TaskNode::new("t2", AgentRole::Generator).with_dependencies(vec!["t1".into()]),
    ];
    let mut agents = HashMap::new();
    agents.insert("t1".to_string(), TaskAgents::new(Arc::new(EchoAgent::new("agent-t1", 0.9))));
    agents.insert("t2".to_string(), TaskAgents::new(Arc::new(EchoAgent::new("agent-t2", 0.9))));
    let options = RunOptions::default().with_default_ttl_secs(0);
    submit_and_run("expired-checkpoint", nodes, HashMap::new(), agents, options).await
}
