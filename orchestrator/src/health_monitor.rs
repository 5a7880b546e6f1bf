//! HealthMonitor (spec §4.6): polls every running agent's `/health` on an
//! interval; three consecutive failures demote it to Unhealthy, a detected
//! process exit marks it Crashed immediately.

use std::time::Duration;

use crate::agent_health::AgentHealth;
use crate::dashboard::DashboardEvent;
use crate::state::AppState;

const CHECK_INTERVAL: Duration = Duration::from_secs(5);
const FAILURE_THRESHOLD: u32 = 3;

pub async fn run(state: AppState) {
    let client = reqwest::Client::new();
    let mut ticker = tokio::time::interval(CHECK_INTERVAL);

    loop {
        ticker.tick().await;

        let agent_ids: Vec<String> = state.agents.read().await.keys().cloned().collect();
        for agent_id in agent_ids {
            check_one(&state, &client, &agent_id).await;
        }
    }
}

async fn check_one(state: &AppState, client: &reqwest::Client, agent_id: &str) {
    let health_url = {
        let Some(spec) = state.config.agents.iter().find(|spec| spec.id == agent_id) else { return };
        spec.health_url.clone()
    };

    let exited = {
        let mut agents = state.agents.write().await;
        let Some(runtime) = agents.get_mut(agent_id) else { return };
        match runtime.child.as_mut().and_then(|child| child.try_wait().ok().flatten()) {
            Some(_status) => true,
            None => false,
        }
    };

    if exited {
        mark_crashed(state, agent_id).await;
        return;
    }

    let healthy = client.get(&health_url).send().await.is_ok_and(|r| r.status().is_success());

    let mut agents = state.agents.write().await;
    let Some(runtime) = agents.get_mut(agent_id) else { return };

    if healthy {
        runtime.consecutive_failures = 0;
        if runtime.health == AgentHealth::Unhealthy {
            runtime.health.transition(AgentHealth::Healthy).ok();
            drop(agents);
            state
                .publish(DashboardEvent::Health {
                    agent_id: agent_id.to_string(),
                    status: "HEALTHY".to_string(),
                })
                .await;
        }
        return;
    }

    runtime.consecutive_failures += 1;
    if runtime.consecutive_failures >= FAILURE_THRESHOLD && runtime.health == AgentHealth::Healthy {
        runtime.health.transition(AgentHealth::Unhealthy).ok();
        drop(agents);
        tracing::warn!(%agent_id, "agent demoted to unhealthy after repeated health-check failures");
        state
            .publish(DashboardEvent::Health { agent_id: agent_id.to_string(), status: "UNHEALTHY".to_string() })
            .await;
    }
}

async fn mark_crashed(state: &AppState, agent_id: &str) {
    {
        let mut agents = state.agents.write().await;
        let Some(runtime) = agents.get_mut(agent_id) else { return };
        runtime.health.transition(AgentHealth::Crashed).ok();
        runtime.child = None;
    }
    tracing::error!(%agent_id, "agent process exited unexpectedly");
    state
        .publish(DashboardEvent::Health { agent_id: agent_id.to_string(), status: "CRASHED".to_string() })
        .await;
    state
        .publish(DashboardEvent::Error {
            agent_id: Some(agent_id.to_string()),
            message: format!("agent {agent_id} crashed"),
        })
        .await;
}
