//! Shared application state for the league-manager binary.
//!
//! spec §5 requires `report_match_result` to run under an exclusive logical
//! lock per tournament so standings and schedule mutations serialize, while
//! `league_query` reads observe the last fully-applied update. A single
//! `tokio::sync::Mutex` guarding everything mutable gives both properties
//! directly: readers and writers alike take the same lock, and every holder
//! sees a fully-consistent snapshot.

use std::sync::Arc;

use league_protocol::config::LeagueConfig;
use league_protocol::rpc::{CircuitRegistry, RpcClient};
use tokio::sync::Mutex;

use crate::match_tracking::OutstandingMatches;
use crate::registry::AgentRegistry;
use crate::scheduler::Schedule;
use crate::standings::Standings;
use crate::tournament_state::{RoundState, TournamentState};

/// Everything that changes over the tournament's lifetime, held behind one lock.
pub struct LeagueData {
    pub registry: AgentRegistry,
    pub schedule: Schedule,
    pub standings: Standings,
    pub outstanding: OutstandingMatches,
    pub tournament_state: TournamentState,
    pub round_state: RoundState,
    pub current_round_index: usize,
}

impl LeagueData {
    fn new(config: &LeagueConfig) -> Self {
        Self {
            registry: AgentRegistry::new(config.max_players, config.max_referees),
            schedule: Schedule::default(),
            standings: Standings::default(),
            outstanding: OutstandingMatches::default(),
            tournament_state: TournamentState::Initializing,
            round_state: RoundState::Pending,
            current_round_index: 0,
        }
    }

    pub fn current_round_id(&self) -> Option<String> {
        self.schedule.rounds.get(self.current_round_index).map(|r| r.round_id.clone())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<LeagueConfig>,
    pub data: Arc<Mutex<LeagueData>>,
    pub circuits: CircuitRegistry,
}

impl AppState {
    pub fn new(config: LeagueConfig) -> Self {
        let circuits = CircuitRegistry::new(config.circuit.clone());
        let config = Arc::new(config);
        let data = Arc::new(Mutex::new(LeagueData::new(&config)));
        Self { config, data, circuits }
    }

    /// Builds an outbound client for calling a remote agent's `/mcp` endpoint,
    /// routed through the endpoint's own circuit breaker.
    pub async fn rpc_client(&self, endpoint: &str) -> RpcClient {
        let breaker = self.circuits.breaker_for(endpoint).await;
        RpcClient::new(endpoint.to_string(), self.config.report_retry.clone(), breaker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_state_starts_in_initializing_with_empty_registry() {
        let state = AppState::new(LeagueConfig::default());
        let data = state.data.lock().await;
        assert_eq!(data.tournament_state, TournamentState::Initializing);
        assert!(data.registry.player_ids().is_empty());
    }
}
