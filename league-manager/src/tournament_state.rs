//! `TournamentState` and `RoundState`: spec §3, driven through the shared
//! [`StateMachine`] contract so an invalid transition is a hard error.

use league_protocol::state_machine::StateMachine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentState {
    Initializing,
    Registration,
    Scheduling,
    RoundActive,
    Completed,
}

impl StateMachine for TournamentState {
    const NAME: &'static str = "TournamentState";

    fn allows(&self, to: &Self) -> bool {
        use TournamentState::*;
        matches!(
            (self, to),
            (Initializing, Registration)
                | (Registration, Scheduling)
                | (Scheduling, RoundActive)
                | (RoundActive, RoundActive)
                | (RoundActive, Completed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    Pending,
    Announced,
    InProgress,
    Completed,
}

impl StateMachine for RoundState {
    const NAME: &'static str = "RoundState";

    fn allows(&self, to: &Self) -> bool {
        use RoundState::*;
        matches!((self, to), (Pending, Announced) | (Announced, InProgress) | (InProgress, Completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tournament_follows_the_happy_path() {
        let mut state = TournamentState::Initializing;
        state.transition(TournamentState::Registration).unwrap();
        state.transition(TournamentState::Scheduling).unwrap();
        state.transition(TournamentState::RoundActive).unwrap();
        state.transition(TournamentState::RoundActive).unwrap(); // next round
        state.transition(TournamentState::Completed).unwrap();
    }

    #[test]
    fn tournament_rejects_skipping_registration() {
        let mut state = TournamentState::Initializing;
        assert!(state.transition(TournamentState::Scheduling).is_err());
        assert_eq!(state, TournamentState::Initializing);
    }

    #[test]
    fn round_follows_the_happy_path() {
        let mut state = RoundState::Pending;
        state.transition(RoundState::Announced).unwrap();
        state.transition(RoundState::InProgress).unwrap();
        state.transition(RoundState::Completed).unwrap();
    }

    #[test]
    fn round_rejects_completing_before_in_progress() {
        let mut state = RoundState::Announced;
        assert!(state.transition(RoundState::Completed).is_err());
    }
}
