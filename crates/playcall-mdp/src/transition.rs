use serde::{Deserialize, Serialize};

use crate::{ACTION_SPACE, STATE_SPACE};

/// Shape of a state-action table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub states: usize,
    pub actions: usize,
}

impl Dimensions {
    /// The play-calling table: [`STATE_SPACE`] × [`ACTION_SPACE`].
    pub const FOOTBALL: Self = Self::new(STATE_SPACE, ACTION_SPACE);

    #[must_use]
    pub const fn new(states: usize, actions: usize) -> Self {
        Self { states, actions }
    }

    /// Number of `(state, action)` cells.
    #[must_use]
    pub const fn cells(&self) -> usize {
        self.states * self.actions
    }

    /// Flat row-major offset of a `(state, action)` cell.
    #[must_use]
    pub const fn cell(&self, state: usize, action: usize) -> usize {
        state * self.actions + action
    }

    pub fn check_state(&self, state: usize) -> Result<(), TransitionError> {
        if state < self.states {
            Ok(())
        } else {
            Err(TransitionError::StateOutOfRange {
                state,
                states: self.states,
            })
        }
    }

    pub fn check_action(&self, action: usize) -> Result<(), TransitionError> {
        if action < self.actions {
            Ok(())
        } else {
            Err(TransitionError::ActionOutOfRange {
                action,
                actions: self.actions,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum TransitionError {
    #[display("state index {state} out of range (table has {states} states)")]
    StateOutOfRange { state: usize, states: usize },
    #[display("action index {action} out of range (table has {actions} actions)")]
    ActionOutOfRange { action: usize, actions: usize },
    #[display("non-finite reward {reward} for state {state}")]
    NonFiniteReward { state: usize, reward: f64 },
}

/// A single logged play: `(state, action, reward, next_state)`.
///
/// All indices are zero-based. `reward` is the expected-points differential of the play
/// and `next_state` may be the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: usize,
    pub action: usize,
    pub reward: f64,
    pub next_state: usize,
}

impl Transition {
    #[must_use]
    pub const fn new(state: usize, action: usize, reward: f64, next_state: usize) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
        }
    }

    /// Checks that every index fits `dims` and the reward is finite.
    ///
    /// Encoded indices are never clamped: a transition that does not fit the table is
    /// rejected.
    pub fn validate(&self, dims: Dimensions) -> Result<(), TransitionError> {
        dims.check_state(self.state)?;
        dims.check_action(self.action)?;
        dims.check_state(self.next_state)?;
        if !self.reward.is_finite() {
            return Err(TransitionError::NonFiniteReward {
                state: self.state,
                reward: self.reward,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_terminal_next_state() {
        let t = Transition::new(0, 3, -1.5, crate::TERMINAL_STATE);
        assert!(t.validate(Dimensions::FOOTBALL).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let dims = Dimensions::new(3, 2);
        assert!(matches!(
            Transition::new(3, 0, 0.0, 0).validate(dims),
            Err(TransitionError::StateOutOfRange { state: 3, states: 3 })
        ));
        assert!(matches!(
            Transition::new(0, 2, 0.0, 0).validate(dims),
            Err(TransitionError::ActionOutOfRange { action: 2, .. })
        ));
        assert!(matches!(
            Transition::new(0, 0, 0.0, 7).validate(dims),
            Err(TransitionError::StateOutOfRange { state: 7, .. })
        ));
        assert!(matches!(
            Transition::new(0, 0, f64::NAN, 1).validate(dims),
            Err(TransitionError::NonFiniteReward { .. })
        ));
    }

    #[test]
    fn test_transition_json_shape() {
        let t: Transition =
            serde_json::from_str(r#"{"state":4,"action":1,"reward":0.5,"next_state":10000}"#)
                .unwrap();
        assert_eq!(t, Transition::new(4, 1, 0.5, 10000));
    }

    #[test]
    fn test_cell_offsets() {
        let dims = Dimensions::new(3, 2);
        assert_eq!(dims.cells(), 6);
        assert_eq!(dims.cell(0, 1), 1);
        assert_eq!(dims.cell(2, 0), 4);
    }
}
