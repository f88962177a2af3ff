//! Synchronous value iteration over an [`MdpModel`].
//!
//! Each sweep computes, for every state,
//!
//! ```text
//! Q(s, a) = R[s][a] + γ · Σ_s' T[s][a][s'] · V[s']
//! V'(s)   = max_a Q(s, a)
//! π(s)    = first argmax_a Q(s, a)
//! ```
//!
//! from the previous sweep's `V` only (Jacobi style); no entry of `V` is overwritten
//! until the whole of `V'` is known. With a stochastic `T` and `γ < 1` the backup is a
//! γ-contraction in the max norm, so the sweeps converge to the unique fixed point.
//! Iteration stops once `max_s |V'(s) - V(s)| < ε`.
//!
//! Sweeps are split into contiguous state ranges evaluated on scoped threads. This does
//! not change the result: every range reads the same previous `V`.
//!
//! # Preconditions
//!
//! The model's rows must be probability distributions: no negative entry and a sum of 1
//! (within [`ROW_SUM_TOLERANCE`]). Models that violate this are rejected with
//! [`SolveError::NegativeProbability`] or [`SolveError::NonStochasticRow`] before the
//! first sweep; the solver never renormalizes.
//!
//! # Iteration Cap
//!
//! `max_iterations` bounds the run. Reaching it is reported through
//! [`ValueIterationSolution::converged`] and a warning log record, not an error.

use std::{num::NonZeroUsize, thread};

use playcall_mdp::{Policy, policy::first_argmax};

use crate::model::{MdpModel, StateValues};

/// Tolerance on `|Σ_s' T[s][a][s'] - 1|`.
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Smallest number of states handed to one sweep thread.
const MIN_STATE_CHUNK: usize = 1024;

/// Parameters of the value-iteration solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueIterationParams {
    /// Discount factor γ, in `(0, 1)`
    pub discount: f64,
    /// Convergence threshold ε on the max-norm change between sweeps
    pub threshold: f64,
    /// Sweep budget
    pub max_iterations: usize,
}

impl Default for ValueIterationParams {
    fn default() -> Self {
        Self {
            discount: 0.95,
            threshold: 0.1,
            max_iterations: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SolveError {
    #[display("discount factor must lie in (0, 1), got {discount}")]
    InvalidDiscount { discount: f64 },
    #[display("convergence threshold must be positive, got {threshold}")]
    InvalidThreshold { threshold: f64 },
    #[display("iteration cap must be positive")]
    ZeroIterationCap,
    #[display(
        "transition ({state}, {action}) -> {next_state} has negative probability {probability}"
    )]
    NegativeProbability {
        state: usize,
        action: usize,
        next_state: usize,
        probability: f64,
    },
    #[display("transition row ({state}, {action}) sums to {sum}, expected 1")]
    NonStochasticRow { state: usize, action: usize, sum: f64 },
    #[display("initial value function has {actual} entries, model has {expected} states")]
    ValueLengthMismatch { expected: usize, actual: usize },
}

/// Result of a value-iteration run.
#[derive(Debug, Clone)]
pub struct ValueIterationSolution {
    values: StateValues,
    policy: Policy,
    iterations: usize,
    final_delta: f64,
    converged: bool,
}

impl ValueIterationSolution {
    /// Optimal state values `V`.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        self.values.as_slice()
    }

    /// Greedy policy with respect to the final sweep.
    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Policy) {
        (self.values.into_vec(), self.policy)
    }

    /// Number of sweeps performed.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Max-norm change of the last sweep.
    #[must_use]
    pub fn final_delta(&self) -> f64 {
        self.final_delta
    }

    /// Whether the threshold was met before the iteration cap.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.converged
    }
}

/// Value-iteration solver.
#[derive(Debug, Clone)]
pub struct ValueIterationSolver {
    params: ValueIterationParams,
}

impl ValueIterationSolver {
    pub fn new(params: ValueIterationParams) -> Result<Self, SolveError> {
        let ValueIterationParams {
            discount,
            threshold,
            max_iterations,
        } = params;
        if discount.is_nan() || discount <= 0.0 || discount >= 1.0 {
            return Err(SolveError::InvalidDiscount { discount });
        }
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(SolveError::InvalidThreshold { threshold });
        }
        if max_iterations == 0 {
            return Err(SolveError::ZeroIterationCap);
        }
        Ok(Self { params })
    }

    #[must_use]
    pub fn params(&self) -> &ValueIterationParams {
        &self.params
    }

    /// Solves from `V ≡ 0`.
    pub fn solve<M>(&self, model: &M) -> Result<ValueIterationSolution, SolveError>
    where
        M: MdpModel + Sync,
    {
        let states = model.dimensions().states;
        self.solve_from(model, vec![0.0; states])
    }

    /// Solves from the given initial value function.
    pub fn solve_from<M>(
        &self,
        model: &M,
        initial: Vec<f64>,
    ) -> Result<ValueIterationSolution, SolveError>
    where
        M: MdpModel + Sync,
    {
        let states = model.dimensions().states;
        if initial.len() != states {
            return Err(SolveError::ValueLengthMismatch {
                expected: states,
                actual: initial.len(),
            });
        }
        validate_model(model)?;

        let mut values = StateValues::new(initial);
        let mut policy = Policy::new(vec![0; states]);
        let mut delta = f64::INFINITY;
        for iteration in 1..=self.params.max_iterations {
            let (next_values, next_policy) = self.backup(model, &values);
            delta = max_abs_diff(next_values.as_slice(), values.as_slice());
            values = next_values;
            policy = next_policy;
            log::debug!("value iteration sweep {iteration}: delta = {delta:.6}");
            if delta < self.params.threshold {
                log::info!("value iteration converged after {iteration} sweeps");
                return Ok(ValueIterationSolution {
                    values,
                    policy,
                    iterations: iteration,
                    final_delta: delta,
                    converged: true,
                });
            }
        }

        log::warn!(
            "value iteration stopped at the cap of {} sweeps without converging (delta = {delta:.6})",
            self.params.max_iterations,
        );
        Ok(ValueIterationSolution {
            values,
            policy,
            iterations: self.params.max_iterations,
            final_delta: delta,
            converged: false,
        })
    }

    /// Performs one synchronous Bellman backup of `values`.
    ///
    /// The model is not validated here.
    #[must_use]
    pub fn backup<M>(&self, model: &M, values: &StateValues) -> (StateValues, Policy)
    where
        M: MdpModel + Sync,
    {
        let states = model.dimensions().states;
        let mut out = vec![(0.0, 0); states];
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let chunk_len = states.div_ceil(workers).max(MIN_STATE_CHUNK);

        thread::scope(|s| {
            for (chunk_index, chunk) in out.chunks_mut(chunk_len).enumerate() {
                let offset = chunk_index * chunk_len;
                s.spawn(move || {
                    for (i, slot) in chunk.iter_mut().enumerate() {
                        *slot = self.best_action(model, values, offset + i);
                    }
                });
            }
        });

        let (next_values, actions) = out.into_iter().unzip();
        (StateValues::new(next_values), Policy::new(actions))
    }

    fn best_action<M>(&self, model: &M, values: &StateValues, state: usize) -> (f64, usize)
    where
        M: MdpModel,
    {
        let q = (0..model.dimensions().actions)
            .map(|action| {
                model.reward(state, action)
                    + self.params.discount * model.expected_value(state, action, values)
            })
            .collect::<Vec<_>>();
        let best = first_argmax(&q);
        (q.get(best).copied().unwrap_or(0.0), best)
    }
}

/// Checks that every `(state, action)` row of `model` is non-negative and sums to 1.
pub fn validate_model<M>(model: &M) -> Result<(), SolveError>
where
    M: MdpModel + ?Sized,
{
    let dims = model.dimensions();
    for state in 0..dims.states {
        for action in 0..dims.actions {
            if let Some((next_state, probability)) = model.negative_entry(state, action) {
                return Err(SolveError::NegativeProbability {
                    state,
                    action,
                    next_state,
                    probability,
                });
            }
            let sum = model.row_sum(state, action);
            if sum.is_nan() || (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(SolveError::NonStochasticRow { state, action, sum });
            }
        }
    }
    Ok(())
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use playcall_mdp::{Dimensions, TERMINAL_STATE, Transition};
    use proptest::prelude::*;

    use super::*;
    use crate::model::{DenseModel, EmpiricalModelEstimator, ModelParams};

    fn solver(discount: f64, threshold: f64) -> ValueIterationSolver {
        ValueIterationSolver::new(ValueIterationParams {
            discount,
            threshold,
            max_iterations: 10_000,
        })
        .unwrap()
    }

    /// Two live states and an absorbing terminal.
    ///
    /// State 0: action 0 scores 1 and ends the drive, action 1 scores 0 and moves to
    /// state 1. State 1: action 0 scores 5 and ends, action 1 loops with reward 0.
    fn chain_model() -> DenseModel {
        DenseModel::new(
            vec![
                vec![vec![0.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]],
                vec![vec![0.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]],
                vec![vec![0.0, 0.0, 1.0], vec![0.0, 0.0, 1.0]],
            ],
            vec![vec![1.0, 0.0], vec![5.0, 0.0], vec![0.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_chain_fixed_point() {
        let solution = solver(0.9, 1e-9).solve(&chain_model()).unwrap();
        assert!(solution.converged());
        let v = solution.values();
        assert!((v[1] - 5.0).abs() < 1e-6);
        assert!((v[0] - 4.5).abs() < 1e-6);
        assert!(v[2].abs() < 1e-12);
        assert_eq!(solution.policy().as_slice(), &[1, 0, 0]);
    }

    #[test]
    fn test_ties_pick_lowest_action() {
        let model = DenseModel::new(
            vec![vec![vec![1.0], vec![1.0]]],
            vec![vec![0.0, 0.0]],
        )
        .unwrap();
        let solution = solver(0.5, 1e-6).solve(&model).unwrap();
        assert_eq!(solution.policy().as_slice(), &[0]);
    }

    #[test]
    fn test_rejects_non_stochastic_rows() {
        let model = DenseModel::new(
            vec![vec![vec![0.5, 0.4]], vec![vec![0.0, 1.0]]],
            vec![vec![1.0], vec![0.0]],
        )
        .unwrap();
        let err = solver(0.9, 0.1).solve(&model).unwrap_err();
        assert!(matches!(
            err,
            SolveError::NonStochasticRow { state: 0, action: 0, .. }
        ));
    }

    #[test]
    fn test_rejects_negative_probabilities() {
        // sums to 1 but is not a distribution
        let model = DenseModel::new(
            vec![vec![vec![2.0, -1.0]], vec![vec![0.0, 1.0]]],
            vec![vec![1.0], vec![0.0]],
        )
        .unwrap();
        assert_eq!(
            validate_model(&model),
            Err(SolveError::NegativeProbability {
                state: 0,
                action: 0,
                next_state: 1,
                probability: -1.0,
            })
        );
        assert!(matches!(
            solver(0.9, 0.1).solve(&model),
            Err(SolveError::NegativeProbability { state: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_params() {
        let bad = |discount, threshold, max_iterations| {
            ValueIterationSolver::new(ValueIterationParams {
                discount,
                threshold,
                max_iterations,
            })
        };
        assert!(matches!(bad(1.0, 0.1, 10), Err(SolveError::InvalidDiscount { .. })));
        assert!(matches!(bad(0.0, 0.1, 10), Err(SolveError::InvalidDiscount { .. })));
        assert!(matches!(bad(0.9, 0.0, 10), Err(SolveError::InvalidThreshold { .. })));
        assert!(matches!(bad(0.9, f64::NAN, 10), Err(SolveError::InvalidThreshold { .. })));
        assert!(matches!(bad(0.9, 0.1, 0), Err(SolveError::ZeroIterationCap)));
    }

    #[test]
    fn test_initial_length_mismatch() {
        let err = solver(0.9, 0.1)
            .solve_from(&chain_model(), vec![0.0; 2])
            .unwrap_err();
        assert!(matches!(
            err,
            SolveError::ValueLengthMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let solver = ValueIterationSolver::new(ValueIterationParams {
            discount: 0.99,
            threshold: 1e-12,
            max_iterations: 3,
        })
        .unwrap();
        // a rewarding self-loop approaches 1 / (1 - γ) = 100 slowly
        let model = DenseModel::new(vec![vec![vec![1.0]]], vec![vec![1.0]]).unwrap();
        let solution = solver.solve(&model).unwrap();
        assert!(!solution.converged());
        assert_eq!(solution.iterations(), 3);
        assert!(solution.final_delta() >= 1e-12);
    }

    #[test]
    fn test_rerun_from_converged_values_is_stable() {
        let solver = solver(0.9, 1e-3);
        let model = chain_model();
        let first = solver.solve(&model).unwrap();
        let second = solver
            .solve_from(&model, first.values().to_vec())
            .unwrap();
        assert_eq!(second.iterations(), 1);
        assert_eq!(second.policy(), first.policy());
        let change = max_abs_diff(first.values(), second.values());
        assert!(change < 1e-3);
    }

    #[test]
    fn test_empirical_model_terminal_policy_does_not_error() {
        let batch = [
            Transition::new(0, 0, 1.0, TERMINAL_STATE),
            Transition::new(0, 3, -0.5, 100),
            Transition::new(100, 2, 3.0, TERMINAL_STATE),
        ];
        let model = EmpiricalModelEstimator::football(ModelParams::default())
            .unwrap()
            .estimate(&batch)
            .unwrap();
        let solution = solver(0.95, 0.1).solve(&model).unwrap();
        assert!(solution.converged());
        assert_eq!(solution.policy().len(), Dimensions::FOOTBALL.states);
        assert!(solution.policy().action(TERMINAL_STATE).is_some());
        assert!(solution.values()[TERMINAL_STATE].abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_backup_is_contraction(
            samples in prop::collection::vec((0..4usize, 0..2usize, -3.0..3.0f64, 0..4usize), 0..30),
            v1 in prop::collection::vec(-10.0..10.0f64, 4),
            v2 in prop::collection::vec(-10.0..10.0f64, 4),
        ) {
            let batch: Vec<_> = samples
                .into_iter()
                .map(|(s, a, r, next)| Transition::new(s, a, r, next))
                .collect();
            let model = EmpiricalModelEstimator::new(Dimensions::new(4, 2), ModelParams::default())
                .unwrap()
                .estimate(&batch)
                .unwrap();
            let solver = solver(0.9, 0.1);
            let before = max_abs_diff(&v1, &v2);
            let (b1, _) = solver.backup(&model, &StateValues::new(v1));
            let (b2, _) = solver.backup(&model, &StateValues::new(v2));
            let after = max_abs_diff(b1.as_slice(), b2.as_slice());
            prop_assert!(after <= 0.9 * before + 1e-9, "after={after} before={before}");
        }
    }
}
