//! Player-agent process state: identity, history store, and the configured
//! strategy, all owned exclusively by this process (spec §4.2 ownership table).

use std::path::PathBuf;
use std::sync::Arc;

use league_protocol::config::LeagueConfig;
use league_protocol::rpc::CircuitRegistry;
use tokio::sync::RwLock;

use crate::history::{HistoryPaths, HistoryStore};
use crate::strategy::Strategy;

#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub player_id: String,
    pub auth_token: String,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<LeagueConfig>,
    pub data_dir: PathBuf,
    pub identity: Arc<RwLock<Identity>>,
    pub history: Arc<RwLock<HistoryStore>>,
    pub strategy: Arc<dyn Strategy>,
    pub circuits: CircuitRegistry,
}

impl AppState {
    pub fn new(config: LeagueConfig, data_dir: PathBuf, strategy: Arc<dyn Strategy>) -> Self {
        let circuits = CircuitRegistry::new(config.circuit.clone());
        Self {
            config: Arc::new(config),
            data_dir,
            identity: Arc::new(RwLock::new(Identity::default())),
            history: Arc::new(RwLock::new(HistoryStore::default())),
            strategy,
            circuits,
        }
    }

    pub async fn history_paths(&self) -> HistoryPaths {
        let player_id = self.identity.read().await.player_id.clone();
        HistoryPaths::new(&self.data_dir, &player_id)
    }

    pub async fn rpc_client(&self, endpoint: &str) -> league_protocol::rpc::RpcClient {
        let breaker = self.circuits.breaker_for(endpoint).await;
        league_protocol::rpc::RpcClient::new(endpoint.to_string(), self.config.report_retry.clone(), breaker)
    }
}
