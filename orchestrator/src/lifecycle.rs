//! LifecycleManager (spec §4.6): spawns each configured agent process in
//! dependency order, waiting for `/health` to answer before moving to the
//! next dependency tier.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::Context;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::Instant;

use crate::agent_health::AgentHealth;
use crate::config::AgentSpec;
use crate::dashboard::DashboardEvent;
use crate::log_aggregator;
use crate::state::{AgentRuntime, AppState};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Starts every configured agent, respecting `dependencies`: agents whose
/// dependencies have not yet reported healthy are held back. Agents with no
/// unmet dependency are started in parallel within a tier.
pub async fn start_all(state: &AppState) -> anyhow::Result<()> {
    let specs: HashMap<String, AgentSpec> =
        state.config.agents.iter().map(|spec| (spec.id.clone(), spec.clone())).collect();
    let mut started: HashSet<String> = HashSet::new();

    while started.len() < specs.len() {
        let ready: Vec<AgentSpec> = specs
            .values()
            .filter(|spec| !started.contains(&spec.id))
            .filter(|spec| spec.dependencies.iter().all(|dep| started.contains(dep)))
            .cloned()
            .collect();

        if ready.is_empty() {
            anyhow::bail!("agent dependency graph has a cycle or missing dependency");
        }

        let handles: Vec<_> = ready
            .iter()
            .cloned()
            .map(|spec| {
                let state = state.clone();
                tokio::spawn(async move { start_agent(&state, &spec).await })
            })
            .collect();

        for (spec, handle) in ready.iter().zip(handles) {
            handle
                .await
                .context("lifecycle task panicked")?
                .with_context(|| format!("failed to start agent {}", spec.id))?;
            started.insert(spec.id.clone());
        }
    }

    Ok(())
}

/// Spawns a single agent's process and blocks until its health endpoint
/// answers, or the startup timeout elapses.
pub async fn start_agent(state: &AppState, spec: &AgentSpec) -> anyhow::Result<()> {
    tracing::info!(agent_id = %spec.id, command = %spec.command, "starting agent");

    let mut child = Command::new(&spec.command)
        .args(&spec.args)
        .current_dir(&spec.working_dir)
        .kill_on_drop(true)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn process for agent {}", spec.id))?;

    if let Some(stdout) = child.stdout.take() {
        log_aggregator::spawn_stream_reader(state.clone(), spec.id.clone(), stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        log_aggregator::spawn_stream_reader(state.clone(), spec.id.clone(), stderr);
    }

    {
        let mut agents = state.agents.write().await;
        agents.insert(
            spec.id.clone(),
            AgentRuntime { health: AgentHealth::Starting, consecutive_failures: 0, child: Some(child) },
        );
    }
    state
        .publish(DashboardEvent::Health { agent_id: spec.id.clone(), status: "STARTING".to_string() })
        .await;

    wait_until_healthy(state, spec).await
}

async fn wait_until_healthy(state: &AppState, spec: &AgentSpec) -> anyhow::Result<()> {
    let deadline = Instant::now() + DEFAULT_STARTUP_TIMEOUT;
    let client = reqwest::Client::new();

    loop {
        if Instant::now() >= deadline {
            anyhow::bail!("agent {} did not become healthy within startup timeout", spec.id);
        }

        if client.get(&spec.health_url).send().await.is_ok_and(|r| r.status().is_success()) {
            let mut agents = state.agents.write().await;
            if let Some(runtime) = agents.get_mut(&spec.id) {
                runtime.health.transition(AgentHealth::Healthy).ok();
            }
            drop(agents);
            state
                .publish(DashboardEvent::Health { agent_id: spec.id.clone(), status: "HEALTHY".to_string() })
                .await;
            tracing::info!(agent_id = %spec.id, "agent healthy");
            return Ok(());
        }

        tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
    }
}
