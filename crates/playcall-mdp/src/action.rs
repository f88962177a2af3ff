use serde::{Deserialize, Serialize};

use crate::MAX_DOWN;

/// A play call.
///
/// The ordinal of each variant is part of the persisted policy format: policy files
/// store `index() + 1` for every state, so the order of [`Action::ALL`] must never change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[display("pass")]
    Pass,
    #[display("run")]
    Run,
    #[display("field goal")]
    FieldGoal,
    #[display("punt")]
    Punt,
}

impl Action {
    /// All play calls in ordinal order.
    pub const ALL: [Action; 4] = [Action::Pass, Action::Run, Action::FieldGoal, Action::Punt];

    /// Returns the zero-based ordinal of this action.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the action with the given zero-based ordinal.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Action::Pass),
            1 => Some(Action::Run),
            2 => Some(Action::FieldGoal),
            3 => Some(Action::Punt),
            _ => None,
        }
    }
}

/// The current down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Down {
    First,
    Second,
    Third,
    Fourth,
}

impl Down {
    /// Converts a raw down number, clamping into `1..=4`.
    ///
    /// Downs past the fourth (which occur in malformed records) are treated as the fourth
    /// down, and a zero down as the first.
    #[must_use]
    pub fn clamped(number: u32) -> Self {
        match number.clamp(1, MAX_DOWN) {
            1 => Down::First,
            2 => Down::Second,
            3 => Down::Third,
            _ => Down::Fourth,
        }
    }

    /// Returns the down number (`1..=4`).
    #[must_use]
    pub const fn number(self) -> u32 {
        self as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_ordinals_are_stable() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(Action::from_index(i), Some(*action));
        }
        assert_eq!(Action::from_index(4), None);
        assert_eq!(Action::Pass.index(), 0);
        assert_eq!(Action::Punt.index(), 3);
    }

    #[test]
    fn test_action_parse() {
        assert_eq!("pass".parse::<Action>().unwrap(), Action::Pass);
        assert_eq!("Punt".parse::<Action>().unwrap(), Action::Punt);
        assert!("kneel".parse::<Action>().is_err());
    }

    #[test]
    fn test_action_serde_names() {
        let json = serde_json::to_string(&Action::FieldGoal).unwrap();
        assert_eq!(json, "\"field_goal\"");
        let action: Action = serde_json::from_str("\"run\"").unwrap();
        assert_eq!(action, Action::Run);
    }

    #[test]
    fn test_down_clamping() {
        assert_eq!(Down::clamped(0), Down::First);
        assert_eq!(Down::clamped(1), Down::First);
        assert_eq!(Down::clamped(3), Down::Third);
        assert_eq!(Down::clamped(4), Down::Fourth);
        assert_eq!(Down::clamped(7), Down::Fourth);
        assert_eq!(Down::Second.number(), 2);
    }
}
