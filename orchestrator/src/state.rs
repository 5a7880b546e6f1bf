//! Shared orchestrator state: health map, child process handles, and the
//! dashboard's broadcast channel, all owned exclusively by this process.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::process::Child;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::agent_health::AgentHealth;
use crate::config::OrchestratorConfig;
use crate::dashboard::DashboardEvent;

pub struct AgentRuntime {
    pub health: AgentHealth,
    pub consecutive_failures: u32,
    pub child: Option<Child>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<OrchestratorConfig>,
    pub agents: Arc<RwLock<HashMap<String, AgentRuntime>>>,
    pub dashboard_tx: broadcast::Sender<DashboardEvent>,
    /// Last event of each dashboard event type, replayed to late subscribers.
    pub last_snapshot: Arc<Mutex<HashMap<String, DashboardEvent>>>,
}

impl AppState {
    pub fn new(config: OrchestratorConfig) -> Self {
        let (dashboard_tx, _rx) = broadcast::channel(256);
        Self {
            config: Arc::new(config),
            agents: Arc::new(RwLock::new(HashMap::new())),
            dashboard_tx,
            last_snapshot: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Broadcasts an event to every current subscriber and updates the
    /// per-type snapshot so a subscriber connecting later still sees state.
    pub async fn publish(&self, event: DashboardEvent) {
        self.last_snapshot.lock().await.insert(event.event_type().to_string(), event.clone());
        let _ = self.dashboard_tx.send(event);
    }
}
