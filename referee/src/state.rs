//! Referee process state: its own identity/token (assigned by the Manager at
//! registration) plus the circuit-breaker registry shared across every
//! outbound call this process makes.

use std::sync::Arc;

use league_protocol::config::LeagueConfig;
use league_protocol::rpc::{CircuitRegistry, RpcClient};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub referee_id: String,
    pub auth_token: String,
    pub manager_endpoint: String,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<LeagueConfig>,
    pub identity: Arc<RwLock<Identity>>,
    pub circuits: CircuitRegistry,
}

impl AppState {
    pub fn new(config: LeagueConfig, manager_endpoint: String) -> Self {
        let circuits = CircuitRegistry::new(config.circuit.clone());
        Self {
            config: Arc::new(config),
            identity: Arc::new(RwLock::new(Identity { manager_endpoint, ..Default::default() })),
            circuits,
        }
    }

    pub async fn rpc_client(&self, endpoint: &str) -> RpcClient {
        let breaker = self.circuits.breaker_for(endpoint).await;
        RpcClient::new(endpoint.to_string(), self.config.report_retry.clone(), breaker)
    }
}
