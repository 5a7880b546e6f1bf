//! Shared configuration: the "recognized set" of options in spec §6, loaded via
//! CLI flags (`clap`, as in the wider pack's server binaries) layered over an
//! optional JSON config file, matching the teacher's `Config::from_env`
//! fail-fast style but extended with a file layer since this system is
//! multi-process and each process needs the same league-wide tunables.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Parser)]
pub struct CommonArgs {
    /// Port this process's HTTP server binds to.
    #[arg(long)]
    pub port: u16,
    /// Optional JSON file supplying the recognized config keys (see spec §6).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Root of the shared persisted-state directory.
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_s: u64,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_delay_s: 2, multiplier: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    pub failure_threshold: u32,
    pub reset_timeout_s: u64,
    pub success_threshold: u32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, reset_timeout_s: 60, success_threshold: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { win: 3, draw: 1, loss: 0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub min_samples: usize,
    pub alpha: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self { min_samples: 5, alpha: 0.05 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    pub league_id: String,
    pub max_players: u32,
    pub max_referees: u32,
    pub invitation_timeout_s: u64,
    pub choice_timeout_s: u64,
    pub report_retry: RetryPolicy,
    pub circuit: CircuitConfig,
    pub health_check_interval_s: u64,
    pub agent_startup_timeout_s: u64,
    pub adaptive: AdaptiveConfig,
    pub scoring: ScoringConfig,
    /// Shared secret the Orchestrator presents to call `start_league` and
    /// `league_query`, since it is not a registered player or referee and so
    /// has no token minted by the registry. Both processes read it from the
    /// same config file; empty means the admin surface is disabled.
    pub admin_token: String,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            league_id: "default-league".to_string(),
            max_players: 64,
            max_referees: 16,
            invitation_timeout_s: 5,
            choice_timeout_s: 30,
            report_retry: RetryPolicy::default(),
            circuit: CircuitConfig::default(),
            health_check_interval_s: 5,
            agent_startup_timeout_s: 30,
            adaptive: AdaptiveConfig::default(),
            scoring: ScoringConfig::default(),
            admin_token: String::new(),
        }
    }
}

impl LeagueConfig {
    /// Defaults overlaid with the JSON file at `path`, if given. Fails fast
    /// (exit code 2 per spec §6) on a malformed config file.
    pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
        let config: LeagueConfig = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("malformed config file {}: {e}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = LeagueConfig::default();
        assert_eq!(cfg.invitation_timeout_s, 5);
        assert_eq!(cfg.choice_timeout_s, 30);
        assert_eq!(cfg.report_retry.max_attempts, 3);
        assert_eq!(cfg.circuit.failure_threshold, 5);
        assert_eq!(cfg.adaptive.min_samples, 5);
        assert_eq!(cfg.scoring.win, 3);
    }

    #[test]
    fn missing_config_path_falls_back_to_defaults() {
        let cfg = LeagueConfig::load(None).unwrap();
        assert_eq!(cfg.league_id, "default-league");
    }
}
