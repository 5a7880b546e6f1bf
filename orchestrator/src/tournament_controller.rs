//! TournamentController (spec §4.6): waits for the configured minimum of
//! referees and players to register with the Manager, triggers
//! `start_league`, then polls `league_query` to keep the dashboard's
//! `round`/`standings` streams current.

use std::time::Duration;

use league_protocol::config::LeagueConfig;
use league_protocol::envelope::{MessageEnvelope, MessageType};
use league_protocol::ids::{format_sender, Role};
use league_protocol::messages::{
    LeagueQueryKind, LeagueQueryRequest, LeagueQueryResponse, StartLeagueRequest, StartLeagueResponse,
};
use league_protocol::rpc::{CircuitRegistry, RpcClient, RpcParams};

use crate::dashboard::DashboardEvent;
use crate::state::AppState;

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const REGISTRATION_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn run(state: AppState, league_config: LeagueConfig, manager_endpoint: String) {
    let client = build_client(&league_config, &manager_endpoint).await;

    if let Err(e) = wait_for_registration(&state, &client, &league_config).await {
        tracing::error!(error = %e, "tournament controller gave up waiting for registration");
        return;
    }

    match start_league(&client, &league_config).await {
        Ok(response) => {
            tracing::info!(total_rounds = response.total_rounds, "league started");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start league");
            return;
        }
    }

    poll_progress(&state, &client, &league_config).await;
}

async fn build_client(config: &LeagueConfig, manager_endpoint: &str) -> RpcClient {
    let circuits = CircuitRegistry::new(config.circuit.clone());
    let breaker = circuits.breaker_for(manager_endpoint).await;
    RpcClient::new(manager_endpoint.to_string(), config.report_retry.clone(), breaker)
}

fn admin_envelope(message_type: MessageType, config: &LeagueConfig) -> MessageEnvelope {
    MessageEnvelope::new(message_type, format_sender(Role::Manager, "admin")).with_auth(config.admin_token.clone())
}

async fn wait_for_registration(
    state: &AppState,
    client: &RpcClient,
    config: &LeagueConfig,
) -> anyhow::Result<()> {
    loop {
        let response = query(client, config, LeagueQueryKind::Standings).await;
        if let Ok(response) = response {
            let registered = response.standings.map(|s| s.len()).unwrap_or(0);
            if registered as u32 >= state.config.min_players {
                return Ok(());
            }
        }
        tokio::time::sleep(REGISTRATION_POLL_INTERVAL).await;
    }
}

async fn start_league(client: &RpcClient, config: &LeagueConfig) -> anyhow::Result<StartLeagueResponse> {
    let envelope = admin_envelope(MessageType::LeagueRegisterRequest, config);
    let params = RpcParams { envelope, body: StartLeagueRequest::default() };
    client
        .call("start_league", &params, Duration::from_secs(config.agent_startup_timeout_s))
        .await
        .map_err(|e| anyhow::anyhow!("start_league call failed: {e}"))
}

async fn query(
    client: &RpcClient,
    config: &LeagueConfig,
    kind: LeagueQueryKind,
) -> anyhow::Result<LeagueQueryResponse> {
    let envelope = admin_envelope(MessageType::LeagueRegisterRequest, config);
    let params = RpcParams { envelope, body: LeagueQueryRequest { query: kind } };
    client
        .call("league_query", &params, Duration::from_secs(10))
        .await
        .map_err(|e| anyhow::anyhow!("league_query call failed: {e}"))
}

async fn poll_progress(state: &AppState, client: &RpcClient, config: &LeagueConfig) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        ticker.tick().await;

        match query(client, config, LeagueQueryKind::Standings).await {
            Ok(response) => {
                if let Some(round_id) = response.current_round.clone() {
                    state
                        .publish(DashboardEvent::Round { round_id, status: response.tournament_state.clone() })
                        .await;
                }
                if let Some(standings) = response.standings {
                    let ranked = standings
                        .into_iter()
                        .map(|row| (row.player_id, row.standing.points))
                        .collect();
                    state
                        .publish(DashboardEvent::Standings { league_id: config.league_id.clone(), ranked })
                        .await;
                }
                if response.tournament_state == "Completed" {
                    tracing::info!(champion = ?response.champion, "tournament completed");
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "league_query poll failed");
            }
        }
    }
}
