//! Model-free path: tabular one-step Q-learning.
//!
//! Each transition `(s, a, r, s')` applies
//!
//! ```text
//! Q[s][a] += α · (r + γ · max_a' Q[s'][a'] - Q[s][a])
//! ```
//!
//! and marks `(s, a)` as tracked. Updates are sequential: each one reads the table left
//! by the previous update, so a pass must consume its batch in order and cannot be split
//! across threads. Replaying the same batch moves the table further toward the fixed
//! point, which is why the [`QTable`] is a long-lived accumulator owned by the caller and
//! threaded through every pass and every input file.

use playcall_mdp::{Dimensions, Policy, Transition, TransitionError};

/// State-action values plus a per-cell visit count.
///
/// A cell is *tracked* once at least one transition has updated it. Untracked cells are
/// the ones the [`NeighborImputer`](crate::imputer::NeighborImputer) may fill in.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    dims: Dimensions,
    values: Vec<f64>,
    visits: Vec<u32>,
}

impl QTable {
    /// Creates an all-zero, fully untracked table.
    #[must_use]
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            values: vec![0.0; dims.cells()],
            visits: vec![0; dims.cells()],
        }
    }

    #[must_use]
    pub fn football() -> Self {
        Self::new(Dimensions::FOOTBALL)
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    #[must_use]
    pub fn value(&self, state: usize, action: usize) -> f64 {
        self.values[self.dims.cell(state, action)]
    }

    /// The action values of `state`.
    #[must_use]
    pub fn row(&self, state: usize) -> &[f64] {
        let start = self.dims.cell(state, 0);
        &self.values[start..start + self.dims.actions]
    }

    #[must_use]
    pub fn max_value(&self, state: usize) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Number of updates applied to `(state, action)`.
    #[must_use]
    pub fn visits(&self, state: usize, action: usize) -> u32 {
        self.visits[self.dims.cell(state, action)]
    }

    #[must_use]
    pub fn is_tracked(&self, state: usize, action: usize) -> bool {
        self.visits(state, action) > 0
    }

    /// Number of tracked cells.
    #[must_use]
    pub fn tracked_cells(&self) -> usize {
        self.visits.iter().filter(|&&v| v > 0).count()
    }

    /// Greedy policy `π[s] = argmax_a Q[s][a]` (lowest action on ties) for every state.
    #[must_use]
    pub fn greedy_policy(&self) -> Policy {
        Policy::greedy(&self.values, self.dims.actions)
    }

    /// The row-major value snapshot.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Overwrites an untracked cell without marking it tracked.
    pub(crate) fn fill_untracked(&mut self, state: usize, action: usize, value: f64) {
        let cell = self.dims.cell(state, action);
        debug_assert_eq!(self.visits[cell], 0, "tracked cells are never filled in");
        self.values[cell] = value;
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum QLearningError {
    #[display("learning rate must lie in (0, 1], got {learning_rate}")]
    InvalidLearningRate { learning_rate: f64 },
    #[display("discount factor must lie in [0, 1), got {discount}")]
    InvalidDiscount { discount: f64 },
    #[display("invalid transition #{index}: {source}")]
    InvalidTransition {
        index: usize,
        source: TransitionError,
    },
}

/// Parameters of the Q-learning update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QLearningParams {
    /// Discount factor γ
    pub discount: f64,
    /// Learning rate α
    pub learning_rate: f64,
}

impl Default for QLearningParams {
    fn default() -> Self {
        Self {
            discount: 0.95,
            learning_rate: 0.1,
        }
    }
}

/// Applies Q-learning updates to a caller-owned [`QTable`].
#[derive(Debug, Clone)]
pub struct QLearningEstimator {
    params: QLearningParams,
}

impl QLearningEstimator {
    pub fn new(params: QLearningParams) -> Result<Self, QLearningError> {
        let QLearningParams {
            discount,
            learning_rate,
        } = params;
        if learning_rate.is_nan() || learning_rate <= 0.0 || learning_rate > 1.0 {
            return Err(QLearningError::InvalidLearningRate { learning_rate });
        }
        if discount.is_nan() || !(0.0..1.0).contains(&discount) {
            return Err(QLearningError::InvalidDiscount { discount });
        }
        Ok(Self { params })
    }

    #[must_use]
    pub fn params(&self) -> &QLearningParams {
        &self.params
    }

    /// Applies a single update.
    ///
    /// A transition that does not fit the table is rejected and leaves it untouched.
    pub fn update(&self, table: &mut QTable, t: &Transition) -> Result<(), TransitionError> {
        t.validate(table.dims)?;
        let QLearningParams {
            discount,
            learning_rate,
        } = self.params;
        let target = t.reward + discount * table.max_value(t.next_state);
        let cell = table.dims.cell(t.state, t.action);
        table.values[cell] += learning_rate * (target - table.values[cell]);
        table.visits[cell] += 1;
        Ok(())
    }

    /// Applies one in-order pass over `batch`.
    ///
    /// Stops at the first invalid transition; earlier updates stay applied.
    pub fn run_pass<'a, I>(&self, table: &mut QTable, batch: I) -> Result<usize, QLearningError>
    where
        I: IntoIterator<Item = &'a Transition>,
    {
        let mut applied = 0;
        for (index, t) in batch.into_iter().enumerate() {
            self.update(table, t)
                .map_err(|source| QLearningError::InvalidTransition { index, source })?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Applies `passes` consecutive passes over the same batch.
    pub fn train(
        &self,
        table: &mut QTable,
        batch: &[Transition],
        passes: usize,
    ) -> Result<(), QLearningError> {
        for pass in 0..passes {
            let applied = self.run_pass(table, batch)?;
            log::debug!(
                "Q-learning pass {}/{passes}: {applied} updates, {} tracked cells",
                pass + 1,
                table.tracked_cells(),
            );
        }
        Ok(())
    }
}
