//! Per-agent health state machine, owned exclusively by the Orchestrator
//! (spec §4.2 ownership table, §4.6 HealthMonitor).

use league_protocol::state_machine::StateMachine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentHealth {
    Starting,
    Healthy,
    Unhealthy,
    Crashed,
}

impl StateMachine for AgentHealth {
    const NAME: &'static str = "AgentHealth";

    fn allows(&self, to: &Self) -> bool {
        use AgentHealth::*;
        matches!(
            (self, to),
            (Starting, Healthy)
                | (Healthy, Unhealthy)
                | (Unhealthy, Healthy)
                | (Healthy, Crashed)
                | (Unhealthy, Crashed)
                | (Starting, Crashed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_from_unhealthy_back_to_healthy() {
        let mut health = AgentHealth::Starting;
        health.transition(AgentHealth::Healthy).unwrap();
        health.transition(AgentHealth::Unhealthy).unwrap();
        health.transition(AgentHealth::Healthy).unwrap();
    }

    #[test]
    fn crash_is_reachable_from_every_non_terminal_state() {
        for from in [AgentHealth::Starting, AgentHealth::Healthy, AgentHealth::Unhealthy] {
            let mut state = from;
            state.transition(AgentHealth::Crashed).unwrap();
            assert_eq!(state, AgentHealth::Crashed);
        }
    }

    #[test]
    fn crashed_is_terminal() {
        let mut state = AgentHealth::Crashed;
        assert!(state.transition(AgentHealth::Healthy).is_err());
    }
}
