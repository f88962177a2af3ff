//! Scoring play-calling policies against logged outcomes.
//!
//! - [`payout`] - Empirical per-state-action payout table built from transitions
//! - [`policy_evaluator`] - Expected payout of a policy and of the five baseline strategies
//! - [`trial`] - Repeated Monte-Carlo comparison of a policy against the random baseline
//!
//! Scores are only comparable when computed from the same payout table over the same
//! sample of states.
//!
//! ```
//! use playcall_evaluator::{payout::PayoutTable, policy_evaluator::PolicyEvaluator};
//! use playcall_mdp::Policy;
//!
//! let payouts = PayoutTable::from_values(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
//! let evaluator = PolicyEvaluator::new(payouts);
//! let score = evaluator.evaluate_policy(&Policy::new(vec![1, 0]), &[0, 1])?;
//! assert_eq!(score, 2.5);
//! # Ok::<(), playcall_evaluator::EvaluateError>(())
//! ```

use playcall_mdp::TransitionError;

pub mod payout;
pub mod policy_evaluator;
pub mod trial;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum EvaluateError {
    #[display("evaluation sample is empty")]
    EmptySample,
    #[display("state {state} is outside the payout table ({states} states)")]
    StateOutOfRange { state: usize, states: usize },
    #[display("policy covers {len} states but state {state} was requested")]
    PolicyTooShort { state: usize, len: usize },
    #[display("policy chooses action {action} in state {state}, but only {actions} actions exist")]
    ActionOutOfRange {
        state: usize,
        action: usize,
        actions: usize,
    },
    #[display("payout table has no actions")]
    EmptyActionSpace,
    #[display("payout row {row} has {actual} entries, expected {expected}")]
    ShapeMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[display("Laplace constant must be finite and non-negative, got {laplace}")]
    InvalidLaplace { laplace: f64 },
    #[display("invalid transition #{index}: {source}")]
    InvalidTransition {
        index: usize,
        source: TransitionError,
    },
}
