//! Per-match state machine: spec §4.3's six phases plus the `ABORTED` sink.

use league_protocol::state_machine::StateMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Idle,
    WaitingForPlayers,
    CollectingChoices,
    DrawingNumber,
    Evaluating,
    Finished,
    Aborted,
}

impl StateMachine for GameState {
    const NAME: &'static str = "GameState";

    fn allows(&self, to: &Self) -> bool {
        use GameState::*;
        matches!(
            (self, to),
            (Idle, WaitingForPlayers)
                | (WaitingForPlayers, CollectingChoices)
                | (CollectingChoices, DrawingNumber)
                | (DrawingNumber, Evaluating)
                | (Evaluating, Finished)
                | (WaitingForPlayers, Aborted)
                | (CollectingChoices, Aborted)
                | (DrawingNumber, Aborted)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_the_full_happy_path() {
        let mut state = GameState::Idle;
        state.transition(GameState::WaitingForPlayers).unwrap();
        state.transition(GameState::CollectingChoices).unwrap();
        state.transition(GameState::DrawingNumber).unwrap();
        state.transition(GameState::Evaluating).unwrap();
        state.transition(GameState::Finished).unwrap();
    }

    #[test]
    fn can_abort_from_any_intermediate_state() {
        let mut state = GameState::CollectingChoices;
        state.transition(GameState::Aborted).unwrap();
        assert_eq!(state, GameState::Aborted);
    }

    #[test]
    fn cannot_skip_drawing_number() {
        let mut state = GameState::CollectingChoices;
        assert!(state.transition(GameState::Evaluating).is_err());
    }

    #[test]
    fn finished_and_aborted_are_terminal() {
        let mut finished = GameState::Finished;
        assert!(finished.transition(GameState::Idle).is_err());
        let mut aborted = GameState::Aborted;
        assert!(aborted.transition(GameState::Idle).is_err());
    }
}
