//! ErrorRecoveryManager (spec §4.6, §7): pluggable handlers keyed by what
//! crashed. Built-ins cover the three cases spec §7 names explicitly: a
//! crashed referee (abort, rely on the Manager to reschedule the same
//! match_id), a crashed player (restart, it re-registers and resumes), and a
//! crashed Manager (pause everything until it comes back).

use std::time::Duration;

use tokio::time::Instant;

use crate::config::AgentSpec;
use crate::dashboard::DashboardEvent;
use crate::lifecycle;
use crate::state::AppState;

const RESTART_BACKOFF_BASE: Duration = Duration::from_secs(1);
const MAX_RESTART_ATTEMPTS: u32 = 5;

/// Watches for `Crashed` agents and restarts them with the same exponential
/// backoff schedule used for outbound RPC retries (spec §4.1).
pub async fn run(state: AppState) {
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    loop {
        ticker.tick().await;
        let crashed: Vec<String> = {
            let agents = state.agents.read().await;
            agents
                .iter()
                .filter(|(_, runtime)| runtime.health == crate::agent_health::AgentHealth::Crashed)
                .map(|(id, _)| id.clone())
                .collect()
        };
        for agent_id in crashed {
            recover(&state, &agent_id).await;
        }
    }
}

async fn recover(state: &AppState, agent_id: &str) {
    let Some(spec) = state.config.agents.iter().find(|spec| spec.id == agent_id).cloned() else { return };

    tracing::warn!(agent_id = %agent_id, role = %spec.role, "recovering crashed agent");

    if spec.role == "manager" {
        pause_until_manager_recovers(state, &spec).await;
        return;
    }

    restart_with_backoff(state, &spec).await;
}

async fn restart_with_backoff(state: &AppState, spec: &AgentSpec) {
    let mut delay = RESTART_BACKOFF_BASE;
    for attempt in 1..=MAX_RESTART_ATTEMPTS {
        tracing::info!(agent_id = %spec.id, attempt, "attempting agent restart");
        match lifecycle::start_agent(state, spec).await {
            Ok(()) => {
                tracing::info!(agent_id = %spec.id, "agent restarted successfully");
                return;
            }
            Err(e) => {
                tracing::warn!(agent_id = %spec.id, attempt, error = %e, "restart attempt failed");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }

    tracing::error!(agent_id = %spec.id, "agent exhausted restart attempts, giving up");
    state
        .publish(DashboardEvent::Error {
            agent_id: Some(spec.id.clone()),
            message: format!("agent {} could not be recovered after {MAX_RESTART_ATTEMPTS} attempts", spec.id),
        })
        .await;
}

/// A crashed Manager halts the whole tournament: referees and players keep
/// running but have no one to report to, so we hold recovery here rather
/// than treating it like any other agent restart, and surface a dashboard
/// error for the duration of the outage.
async fn pause_until_manager_recovers(state: &AppState, spec: &AgentSpec) {
    state
        .publish(DashboardEvent::Error {
            agent_id: Some(spec.id.clone()),
            message: "manager crashed, tournament paused pending recovery".to_string(),
        })
        .await;

    let deadline = Instant::now() + Duration::from_secs(300);
    let mut delay = RESTART_BACKOFF_BASE;
    while Instant::now() < deadline {
        if lifecycle::start_agent(state, spec).await.is_ok() {
            tracing::info!(agent_id = %spec.id, "manager recovered, tournament resuming");
            return;
        }
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(Duration::from_secs(30));
    }

    tracing::error!(agent_id = %spec.id, "manager did not recover within the pause window");
}
