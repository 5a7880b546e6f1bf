//! Orchestrator-specific configuration: the roster of agents to launch, read
//! from the same JSON config file as the rest of the league (spec §6) under
//! an `agents` key the other processes ignore.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    pub role: String,
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub health_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub agents: Vec<AgentSpec>,
    pub min_referees: u32,
    pub min_players: u32,
    pub dashboard_port: u16,
}

impl OrchestratorConfig {
    pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::defaults());
        };
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
        let config: OrchestratorConfig = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("malformed config file {}: {e}", path.display()))?;
        Ok(config)
    }

    fn defaults() -> Self {
        Self { agents: Vec::new(), min_referees: 2, min_players: 4, dashboard_port: 9000 }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::defaults()
    }
}
