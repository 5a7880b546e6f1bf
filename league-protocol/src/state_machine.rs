//! Generic explicit-transition-table state machine. Every state enum in this
//! system (`GameState`, `RoundState`, `TournamentState`, `AgentHealth`) implements
//! [`StateMachine`] and is driven exclusively through [`StateMachine::transition`] —
//! an invalid transition is a hard error, never a silent no-op, and every
//! successful transition is logged.

use std::fmt::Debug;

#[derive(Debug, thiserror::Error)]
#[error("invalid transition for {machine}: {from:?} -> {to:?}")]
pub struct TransitionError<S: Debug> {
    pub machine: &'static str,
    pub from: S,
    pub to: S,
}

pub trait StateMachine: Sized + Copy + Debug + PartialEq {
    /// Name used in log lines, e.g. `"GameState"`.
    const NAME: &'static str;

    /// Whether `to` is a legal successor of `self`.
    fn allows(&self, to: &Self) -> bool;

    /// Attempts the transition, logging on success and returning an error
    /// (without mutating `self`) on an illegal move.
    fn transition(&mut self, to: Self) -> Result<(), TransitionError<Self>> {
        if !self.allows(&to) {
            return Err(TransitionError { machine: Self::NAME, from: *self, to });
        }
        let from = *self;
        *self = to;
        tracing::debug!(machine = Self::NAME, ?from, ?to, "state transition");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
        Yellow,
    }

    impl StateMachine for Light {
        const NAME: &'static str = "Light";
        fn allows(&self, to: &Self) -> bool {
            matches!(
                (self, to),
                (Light::Red, Light::Green) | (Light::Green, Light::Yellow) | (Light::Yellow, Light::Red)
            )
        }
    }

    #[test]
    fn legal_transition_mutates_state() {
        let mut light = Light::Red;
        light.transition(Light::Green).unwrap();
        assert_eq!(light, Light::Green);
    }

    #[test]
    fn illegal_transition_is_rejected_and_state_unchanged() {
        let mut light = Light::Red;
        let err = light.transition(Light::Yellow);
        assert!(err.is_err());
        assert_eq!(light, Light::Red);
    }
}
