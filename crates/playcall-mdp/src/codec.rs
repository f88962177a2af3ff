//! Encoding between field situations and flat state indices.
//!
//! The encoding is a mixed-radix number with the down as the most significant digit:
//!
//! ```text
//! index = 2500 × (down - 1) + 100 × (yards_to_go - 1) + (field_position - 1)
//! ```
//!
//! Inputs are clamped before encoding (`down ∈ 1..=4`, `yards_to_go ∈ 1..=25`,
//! `field_position ∈ 1..=99`), so [`StateCodec::encode`] is total and never fails.
//! Out-of-range raw values are a property of the logged data, not an error.
//!
//! [`StateCodec::decode`] is defined for every regular index (`0..10000`). Indices whose
//! field-position digit is `99` decode to `field_position == 100`; the encoder never
//! produces them, but the tables still reserve their rows.

use serde::{Deserialize, Serialize};

use crate::{Down, MAX_FIELD_POSITION, MAX_YARDS_TO_GO, REGULAR_STATE_COUNT, TERMINAL_STATE};

const DOWN_STRIDE: usize = 2500;
const YARDS_TO_GO_STRIDE: usize = 100;

/// A clamped field situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    down: Down,
    yards_to_go: u8,
    field_position: u8,
}

impl Observation {
    /// Creates an observation from raw record values, clamping each coordinate.
    ///
    /// # Examples
    ///
    /// ```
    /// use playcall_mdp::{Down, Observation};
    ///
    /// let obs = Observation::clamped(5, 40, 100);
    /// assert_eq!(obs.down(), Down::Fourth);
    /// assert_eq!(obs.yards_to_go(), 25);
    /// assert_eq!(obs.field_position(), 99);
    /// ```
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn clamped(down: u32, yards_to_go: u32, field_position: u32) -> Self {
        Self {
            down: Down::clamped(down),
            yards_to_go: yards_to_go.clamp(1, MAX_YARDS_TO_GO) as u8,
            field_position: field_position.clamp(1, MAX_FIELD_POSITION) as u8,
        }
    }

    #[must_use]
    pub fn down(&self) -> Down {
        self.down
    }

    #[must_use]
    pub fn yards_to_go(&self) -> u8 {
        self.yards_to_go
    }

    /// Distance to the opponent's end zone in yards.
    #[must_use]
    pub fn field_position(&self) -> u8 {
        self.field_position
    }

    /// Returns `[down, yards_to_go, field_position]` as grid coordinates.
    #[expect(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn coordinates(&self) -> [i32; 3] {
        [
            self.down.number() as i32,
            i32::from(self.yards_to_go),
            i32::from(self.field_position),
        ]
    }
}

/// A state as it appears in a raw record, before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawState {
    /// A live-ball situation with unclamped record values.
    Live {
        down: u32,
        yards_to_go: u32,
        field_position: u32,
    },
    /// The drive ended (score, punt, turnover).
    Terminal,
}

/// Bidirectional mapping between [`Observation`]s and state indices.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateCodec;

impl StateCodec {
    /// Encodes an observation into a regular state index (`0..10000`).
    #[must_use]
    pub fn encode(obs: Observation) -> usize {
        DOWN_STRIDE * (obs.down.number() as usize - 1)
            + YARDS_TO_GO_STRIDE * (usize::from(obs.yards_to_go) - 1)
            + (usize::from(obs.field_position) - 1)
    }

    /// Encodes a raw record state, mapping the terminal marker to [`TERMINAL_STATE`].
    #[must_use]
    pub fn encode_raw(raw: RawState) -> usize {
        match raw {
            RawState::Live {
                down,
                yards_to_go,
                field_position,
            } => Self::encode(Observation::clamped(down, yards_to_go, field_position)),
            RawState::Terminal => TERMINAL_STATE,
        }
    }

    /// Decodes a regular state index.
    ///
    /// Returns `None` for the terminal state and for indices outside the table.
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn decode(state: usize) -> Option<Observation> {
        if state >= REGULAR_STATE_COUNT {
            return None;
        }
        let down = state / DOWN_STRIDE;
        let yards_to_go = (state % DOWN_STRIDE) / YARDS_TO_GO_STRIDE;
        let field_position = state % YARDS_TO_GO_STRIDE;
        Some(Observation {
            down: Down::clamped(down as u32 + 1),
            yards_to_go: yards_to_go as u8 + 1,
            field_position: field_position as u8 + 1,
        })
    }

    /// Returns the grid coordinates of every regular state, indexed by state.
    #[must_use]
    pub fn regular_state_coordinates() -> Vec<[i32; 3]> {
        (0..REGULAR_STATE_COUNT)
            .filter_map(Self::decode)
            .map(|obs| obs.coordinates())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_encode_corners() {
        assert_eq!(StateCodec::encode(Observation::clamped(1, 1, 1)), 0);
        assert_eq!(StateCodec::encode(Observation::clamped(1, 1, 99)), 98);
        assert_eq!(StateCodec::encode(Observation::clamped(1, 2, 1)), 100);
        assert_eq!(StateCodec::encode(Observation::clamped(2, 1, 1)), 2500);
        assert_eq!(StateCodec::encode(Observation::clamped(4, 25, 99)), 9998);
    }

    #[test]
    fn test_encode_clamps_out_of_range() {
        let clamped = StateCodec::encode(Observation::clamped(4, 25, 99));
        assert_eq!(StateCodec::encode(Observation::clamped(9, 60, 100)), clamped);
        assert_eq!(
            StateCodec::encode(Observation::clamped(0, 0, 0)),
            StateCodec::encode(Observation::clamped(1, 1, 1))
        );
    }

    #[test]
    fn test_terminal_marker() {
        assert_eq!(StateCodec::encode_raw(RawState::Terminal), TERMINAL_STATE);
        assert_eq!(StateCodec::decode(TERMINAL_STATE), None);
        assert_eq!(StateCodec::decode(TERMINAL_STATE + 1), None);
    }

    #[test]
    fn test_raw_live_state_is_clamped() {
        let raw = RawState::Live {
            down: 3,
            yards_to_go: 31,
            field_position: 12,
        };
        assert_eq!(
            StateCodec::encode_raw(raw),
            StateCodec::encode(Observation::clamped(3, 25, 12))
        );
    }

    #[test]
    fn test_decode_reserved_field_position_digit() {
        let obs = StateCodec::decode(99).unwrap();
        assert_eq!(obs.down(), Down::First);
        assert_eq!(obs.yards_to_go(), 1);
        assert_eq!(obs.field_position(), 100);
    }

    #[test]
    fn test_regular_state_coordinates() {
        let coords = StateCodec::regular_state_coordinates();
        assert_eq!(coords.len(), REGULAR_STATE_COUNT);
        assert_eq!(coords[0], [1, 1, 1]);
        assert_eq!(coords[2500 + 100 + 4], [2, 2, 5]);
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(down in 1..=4u32, to_go in 1..=25u32, fp in 1..=99u32) {
            let obs = Observation::clamped(down, to_go, fp);
            let state = StateCodec::encode(obs);
            prop_assert!(state < REGULAR_STATE_COUNT);
            prop_assert_eq!(StateCodec::decode(state), Some(obs));
        }

        #[test]
        fn prop_encode_inverts_decode(state in 0..REGULAR_STATE_COUNT) {
            let obs = StateCodec::decode(state).unwrap();
            prop_assert_eq!(StateCodec::encode(obs), state);
        }

        #[test]
        fn prop_encode_is_injective(
            a in (1..=4u32, 1..=25u32, 1..=99u32),
            b in (1..=4u32, 1..=25u32, 1..=99u32),
        ) {
            let (oa, ob) = (Observation::clamped(a.0, a.1, a.2), Observation::clamped(b.0, b.1, b.2));
            if oa != ob {
                prop_assert_ne!(StateCodec::encode(oa), StateCodec::encode(ob));
            }
        }
    }
}
