//! Model-based path: estimating transition probabilities and rewards from logged plays.
//!
//! # Smoothing
//!
//! Two independent additive (Laplace) schemes with the same constant `λ`:
//!
//! ```text
//! T[s][a][s'] = (N[s][a][s'] + λ) / (n[s][a] + λ·S)       (pseudo-count on every next state)
//! R[s][a]     = ΣR[s][a] / (n[s][a] + λ)                  (one pseudo-visit with zero reward)
//! ```
//!
//! where `n[s][a]` is the number of observed samples and `S` the number of states.
//! Every row of `T` sums to 1, including rows with no samples (they become uniform).
//!
//! The reward divisor adds `λ` pseudo-visits, not a fixed 1, so the reward and
//! transition estimates move together when `λ` changes. At the default `λ = 1` it is the
//! usual add-one visit count.
//!
//! # Representation
//!
//! A dense `S × A × S` tensor needs ~4·10⁸ floats for the play-calling table. The
//! [`EmpiricalModel`] instead keeps only the observed `(s, a, s')` counts; the smoothing
//! mass is an analytically known uniform residual, so probabilities and expectations
//! are identical to the dense normalized table:
//!
//! ```text
//! Σ_s' T[s][a][s']·V[s'] = (Σ_observed N[s][a][s']·V[s'] + λ·ΣV) / (n[s][a] + λ·S)
//! ```
//!
//! [`DenseModel`] holds explicit tables for callers that bring their own model.

use std::collections::BTreeMap;

use playcall_mdp::{Dimensions, TERMINAL_STATE, Transition, TransitionError};

/// A finite MDP as seen by the value-iteration solver.
pub trait MdpModel {
    /// Table shape.
    fn dimensions(&self) -> Dimensions;

    /// Expected immediate reward `R[s][a]`.
    fn reward(&self, state: usize, action: usize) -> f64;

    /// Expected next-state value `Σ_s' T[s][a][s']·V[s']`.
    fn expected_value(&self, state: usize, action: usize, values: &StateValues) -> f64;

    /// Row sum `Σ_s' T[s][a][s']`; 1 for a valid model.
    fn row_sum(&self, state: usize, action: usize) -> f64;

    /// The first next state with `T[s][a][s'] < 0`, with its probability.
    fn negative_entry(&self, state: usize, action: usize) -> Option<(usize, f64)>;
}

/// A value per state, with its total cached for the smoothed-row expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct StateValues {
    values: Vec<f64>,
    sum: f64,
}

impl StateValues {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        let sum = values.iter().sum();
        Self { values, sum }
    }

    #[must_use]
    pub fn zeros(states: usize) -> Self {
        Self::new(vec![0.0; states])
    }

    #[must_use]
    pub fn get(&self, state: usize) -> f64 {
        self.values[state]
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ModelError {
    #[display("Laplace constant must be finite and non-negative, got {laplace}")]
    InvalidLaplace { laplace: f64 },
    #[display("absorbing state {state} is outside the table ({states} states)")]
    AbsorbingStateOutOfRange { state: usize, states: usize },
    #[display("invalid transition #{index}: {source}")]
    InvalidTransition {
        index: usize,
        source: TransitionError,
    },
    #[display("model has no actions")]
    EmptyActionSpace,
    #[display("{what} has length {actual}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Parameters of the empirical model estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    /// Laplace pseudo-count `λ ≥ 0`
    pub laplace: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self { laplace: 1.0 }
    }
}

#[derive(Debug, Clone, Default)]
struct CellCounts {
    next_states: BTreeMap<usize, u32>,
    visits: u32,
    reward_sum: f64,
}

/// Builds an [`EmpiricalModel`] from a batch of transitions.
#[derive(Debug, Clone)]
pub struct EmpiricalModelEstimator {
    dims: Dimensions,
    params: ModelParams,
    absorbing: Option<usize>,
}

impl EmpiricalModelEstimator {
    pub fn new(dims: Dimensions, params: ModelParams) -> Result<Self, ModelError> {
        if dims.actions == 0 {
            return Err(ModelError::EmptyActionSpace);
        }
        if !params.laplace.is_finite() || params.laplace < 0.0 {
            return Err(ModelError::InvalidLaplace {
                laplace: params.laplace,
            });
        }
        Ok(Self {
            dims,
            params,
            absorbing: None,
        })
    }

    /// Estimator for the play-calling table with [`TERMINAL_STATE`] absorbing.
    pub fn football(params: ModelParams) -> Result<Self, ModelError> {
        Self::new(Dimensions::FOOTBALL, params)?.with_absorbing_state(TERMINAL_STATE)
    }

    /// Marks `state` as absorbing: every action stays in it with zero reward.
    pub fn with_absorbing_state(mut self, state: usize) -> Result<Self, ModelError> {
        if state >= self.dims.states {
            return Err(ModelError::AbsorbingStateOutOfRange {
                state,
                states: self.dims.states,
            });
        }
        self.absorbing = Some(state);
        Ok(self)
    }

    /// Counts the batch and returns the smoothed model.
    ///
    /// An empty batch is not an error; it yields the uniform model.
    pub fn estimate<'a, I>(&self, batch: I) -> Result<EmpiricalModel, ModelError>
    where
        I: IntoIterator<Item = &'a Transition>,
    {
        let mut cells = vec![CellCounts::default(); self.dims.cells()];
        let mut samples = 0;
        for (index, t) in batch.into_iter().enumerate() {
            t.validate(self.dims)
                .map_err(|source| ModelError::InvalidTransition { index, source })?;
            let cell = &mut cells[self.dims.cell(t.state, t.action)];
            *cell.next_states.entry(t.next_state).or_default() += 1;
            cell.visits += 1;
            cell.reward_sum += t.reward;
            samples += 1;
        }

        let model = EmpiricalModel {
            dims: self.dims,
            laplace: self.params.laplace,
            absorbing: self.absorbing,
            cells,
        };
        log::debug!(
            "estimated model from {samples} transitions ({} of {} state-actions observed)",
            model.observed_cells(),
            self.dims.cells(),
        );
        Ok(model)
    }
}

/// Laplace-smoothed transition and reward estimates, stored sparsely.
#[derive(Debug, Clone)]
pub struct EmpiricalModel {
    dims: Dimensions,
    laplace: f64,
    absorbing: Option<usize>,
    cells: Vec<CellCounts>,
}

impl EmpiricalModel {
    fn cell(&self, state: usize, action: usize) -> &CellCounts {
        &self.cells[self.dims.cell(state, action)]
    }

    fn is_absorbing(&self, state: usize) -> bool {
        self.absorbing == Some(state)
    }

    #[expect(clippy::cast_precision_loss)]
    fn state_count(&self) -> f64 {
        self.dims.states as f64
    }

    /// Row normalizer `n + λ·S`.
    fn normalizer(&self, cell: &CellCounts) -> f64 {
        f64::from(cell.visits) + self.laplace * self.state_count()
    }

    #[must_use]
    pub fn laplace(&self) -> f64 {
        self.laplace
    }

    /// Number of samples observed for `(state, action)`.
    #[must_use]
    pub fn visits(&self, state: usize, action: usize) -> u32 {
        self.cell(state, action).visits
    }

    /// Number of `(state, action)` cells with at least one sample.
    #[must_use]
    pub fn observed_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.visits > 0).count()
    }

    /// Smoothed probability `T[state][action][next_state]`.
    #[must_use]
    pub fn probability(&self, state: usize, action: usize, next_state: usize) -> f64 {
        if self.is_absorbing(state) {
            return if next_state == state { 1.0 } else { 0.0 };
        }
        let cell = self.cell(state, action);
        let z = self.normalizer(cell);
        if z == 0.0 {
            // λ = 0 and no samples: fall back to uniform
            return 1.0 / self.state_count();
        }
        let count = cell.next_states.get(&next_state).copied().unwrap_or(0);
        (f64::from(count) + self.laplace) / z
    }

    /// The full smoothed row `T[state][action][·]`.
    #[must_use]
    pub fn transition_row(&self, state: usize, action: usize) -> Vec<f64> {
        (0..self.dims.states)
            .map(|next| self.probability(state, action, next))
            .collect()
    }
}

impl MdpModel for EmpiricalModel {
    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn reward(&self, state: usize, action: usize) -> f64 {
        if self.is_absorbing(state) {
            return 0.0;
        }
        let cell = self.cell(state, action);
        let denominator = f64::from(cell.visits) + self.laplace;
        if denominator == 0.0 {
            0.0
        } else {
            cell.reward_sum / denominator
        }
    }

    fn expected_value(&self, state: usize, action: usize, values: &StateValues) -> f64 {
        if self.is_absorbing(state) {
            return values.get(state);
        }
        let cell = self.cell(state, action);
        let z = self.normalizer(cell);
        if z == 0.0 {
            return values.sum() / self.state_count();
        }
        let observed = cell
            .next_states
            .iter()
            .map(|(&next, &count)| f64::from(count) * values.get(next))
            .sum::<f64>();
        (observed + self.laplace * values.sum()) / z
    }

    fn row_sum(&self, state: usize, action: usize) -> f64 {
        if self.is_absorbing(state) {
            return 1.0;
        }
        let cell = self.cell(state, action);
        let z = self.normalizer(cell);
        if z == 0.0 {
            return 1.0;
        }
        let counted = cell.next_states.values().copied().map(f64::from).sum::<f64>();
        (counted + self.laplace * self.state_count()) / z
    }

    fn negative_entry(&self, _state: usize, _action: usize) -> Option<(usize, f64)> {
        // counts and λ are non-negative
        None
    }
}

/// Explicit `T[s][a][s']` and `R[s][a]` tables.
///
/// No normalization is applied; the solver rejects rows that do not sum to 1.
#[derive(Debug, Clone)]
pub struct DenseModel {
    dims: Dimensions,
    transitions: Vec<f64>,
    rewards: Vec<f64>,
}

impl DenseModel {
    /// Creates a model from nested `transitions[s][a][s']` and `rewards[s][a]`.
    pub fn new(
        transitions: Vec<Vec<Vec<f64>>>,
        rewards: Vec<Vec<f64>>,
    ) -> Result<Self, ModelError> {
        let states = rewards.len();
        let actions = rewards.first().map_or(0, Vec::len);
        if actions == 0 {
            return Err(ModelError::EmptyActionSpace);
        }
        let dims = Dimensions::new(states, actions);

        check_len("transition table", states, transitions.len())?;
        let mut flat_rewards = Vec::with_capacity(dims.cells());
        for row in rewards {
            check_len("reward row", actions, row.len())?;
            flat_rewards.extend(row);
        }
        let mut flat_transitions = Vec::with_capacity(dims.cells() * states);
        for per_action in transitions {
            check_len("transition action block", actions, per_action.len())?;
            for row in per_action {
                check_len("transition row", states, row.len())?;
                flat_transitions.extend(row);
            }
        }

        Ok(Self {
            dims,
            transitions: flat_transitions,
            rewards: flat_rewards,
        })
    }

    fn row(&self, state: usize, action: usize) -> &[f64] {
        let start = self.dims.cell(state, action) * self.dims.states;
        &self.transitions[start..start + self.dims.states]
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), ModelError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ModelError::ShapeMismatch {
            what,
            expected,
            actual,
        })
    }
}

impl MdpModel for DenseModel {
    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn reward(&self, state: usize, action: usize) -> f64 {
        self.rewards[self.dims.cell(state, action)]
    }

    fn expected_value(&self, state: usize, action: usize, values: &StateValues) -> f64 {
        self.row(state, action)
            .iter()
            .zip(values.as_slice())
            .map(|(p, v)| p * v)
            .sum()
    }

    fn row_sum(&self, state: usize, action: usize) -> f64 {
        self.row(state, action).iter().sum()
    }

    fn negative_entry(&self, state: usize, action: usize) -> Option<(usize, f64)> {
        self.row(state, action)
            .iter()
            .copied()
            .enumerate()
            .find(|&(_, p)| p < 0.0)
    }
}
