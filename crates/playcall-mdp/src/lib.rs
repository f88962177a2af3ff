//! Discretized play-calling decision process.
//!
//! This crate fixes the vocabulary shared by the solvers and the evaluator:
//!
//! - [`action`] - The closed set of play calls ([`Action`]) and downs ([`Down`])
//! - [`codec`] - Bidirectional mapping between field situations and flat state indices
//! - [`transition`] - Logged `(state, action, reward, next_state)` samples and table shapes
//! - [`policy`] - Per-state action tables and their newline-delimited file format
//!
//! # State Space
//!
//! A regular state is a `(down, yards_to_go, field_position)` triple, clamped to
//! `down ≤ 4`, `yards_to_go ≤ 25` and `field_position ≤ 99` before encoding:
//!
//! ```text
//! index = 2500 × (down - 1) + 100 × (yards_to_go - 1) + (field_position - 1)
//! ```
//!
//! Indices `0..10000` are regular states; [`TERMINAL_STATE`] (`10000`) is the single
//! absorbing state that ends a drive. The full table therefore has [`STATE_SPACE`]
//! (`10001`) rows.
//!
//! ```
//! use playcall_mdp::{Observation, StateCodec, TERMINAL_STATE, codec::RawState};
//!
//! let obs = Observation::clamped(3, 7, 42);
//! let state = StateCodec::encode(obs);
//! assert_eq!(StateCodec::decode(state), Some(obs));
//!
//! assert_eq!(StateCodec::encode_raw(RawState::Terminal), TERMINAL_STATE);
//! assert_eq!(StateCodec::decode(TERMINAL_STATE), None);
//! ```

pub use self::{
    action::{Action, Down},
    codec::{Observation, StateCodec},
    policy::{Policy, PolicyError},
    transition::{Dimensions, Transition, TransitionError},
};

pub mod action;
pub mod codec;
pub mod policy;
pub mod transition;

/// Number of regular (non-terminal) states.
pub const REGULAR_STATE_COUNT: usize = 10_000;

/// Index of the absorbing terminal state.
pub const TERMINAL_STATE: usize = REGULAR_STATE_COUNT;

/// Total number of state indices, terminal state included.
pub const STATE_SPACE: usize = REGULAR_STATE_COUNT + 1;

/// Number of play calls.
pub const ACTION_SPACE: usize = Action::ALL.len();

/// Largest down before clamping.
pub const MAX_DOWN: u32 = 4;

/// Largest yards-to-go before clamping.
pub const MAX_YARDS_TO_GO: u32 = 25;

/// Largest field position before clamping.
pub const MAX_FIELD_POSITION: u32 = 99;
