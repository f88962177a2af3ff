//! Policy estimation for the play-calling decision process.
//!
//! Two independent paths turn a batch of logged [`Transition`](playcall_mdp::Transition)s
//! into a per-state [`Policy`](playcall_mdp::Policy):
//!
//! - **Model-based**: [`model::EmpiricalModelEstimator`] counts the batch into a
//!   Laplace-smoothed transition/reward model, and [`value_iteration::ValueIterationSolver`]
//!   iterates the Bellman optimality backup to a fixed point.
//! - **Model-free**: [`q_learning::QLearningEstimator`] applies one-step Q-learning updates
//!   to a long-lived [`q_learning::QTable`], and [`imputer::NeighborImputer`] fills the
//!   cells no sample ever reached from their nearest neighbors ([`spatial::GridIndex`])
//!   before the greedy policy is read off.
//!
//! ```
//! use playcall_mdp::{Dimensions, Transition};
//! use playcall_solver::{
//!     model::{EmpiricalModelEstimator, ModelParams},
//!     value_iteration::{ValueIterationParams, ValueIterationSolver},
//! };
//!
//! let batch = [Transition::new(0, 1, 1.0, 1), Transition::new(0, 0, 0.0, 1)];
//! let model = EmpiricalModelEstimator::new(Dimensions::new(2, 2), ModelParams::default())?
//!     .with_absorbing_state(1)?
//!     .estimate(&batch)?;
//! let solution = ValueIterationSolver::new(ValueIterationParams::default())?.solve(&model)?;
//! assert_eq!(solution.policy().action(0), Some(1));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod imputer;
pub mod model;
pub mod q_learning;
pub mod spatial;
pub mod value_iteration;
