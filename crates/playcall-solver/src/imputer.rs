//! Filling in unobserved Q-table cells from structurally similar states.
//!
//! For every untracked `(s, a)` the imputer looks up the `k` states closest to `s` in
//! `(down, yards_to_go, field_position)` space. `s` itself is always the nearest one (at
//! distance 0) and is dropped; the cell becomes the mean of `Q[n][a]` over the other
//! `k - 1` neighbors, tracked or not.
//!
//! All means are taken from a snapshot of the table made before the first write, so the
//! result does not depend on the order in which cells are visited. Tracked cells are
//! never written.
//!
//! This is heuristic generalization, not inference: a neighborhood in which no neighbor
//! was ever observed for an action simply averages their initial zeros.

use playcall_mdp::StateCodec;

use crate::{q_learning::QTable, spatial::GridIndex};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ImputeError {
    #[display("neighbor count must be at least 2 (the state itself plus one other), got {neighbors}")]
    InvalidNeighborCount { neighbors: usize },
    #[display("spatial index has {points} points but the Q-table only has {states} states")]
    SizeMismatch { points: usize, states: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImputerParams {
    /// Neighbor count `k`, including the state itself
    pub neighbors: usize,
}

impl Default for ImputerParams {
    fn default() -> Self {
        Self { neighbors: 10 }
    }
}

/// What an [`NeighborImputer::impute`] call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImputeReport {
    /// Cells that received an imputed value
    pub imputed_cells: usize,
    /// States with at least one imputed cell
    pub imputed_states: usize,
}

/// k-nearest-neighbor imputer over a fixed spatial index.
///
/// Point `i` of the index stands for state `i`. States beyond the last point (such as
/// the terminal state) have no coordinates and are left alone.
#[derive(Debug, Clone)]
pub struct NeighborImputer {
    index: GridIndex,
    neighbors: usize,
}

impl NeighborImputer {
    pub fn new(index: GridIndex, params: ImputerParams) -> Result<Self, ImputeError> {
        if params.neighbors < 2 {
            return Err(ImputeError::InvalidNeighborCount {
                neighbors: params.neighbors,
            });
        }
        Ok(Self {
            index,
            neighbors: params.neighbors,
        })
    }

    /// Imputer over every regular play-calling state.
    pub fn football(params: ImputerParams) -> Result<Self, ImputeError> {
        Self::new(
            GridIndex::new(StateCodec::regular_state_coordinates()),
            params,
        )
    }

    #[must_use]
    pub fn neighbors(&self) -> usize {
        self.neighbors
    }

    /// The `k - 1` states closest to `state`, excluding `state` itself.
    #[must_use]
    pub fn neighbors_of(&self, state: usize) -> Vec<usize> {
        self.index
            .nearest(self.index.point(state), self.neighbors)
            .into_iter()
            .map(|n| n.index)
            .filter(|&n| n != state)
            .take(self.neighbors - 1)
            .collect()
    }

    /// Overwrites every untracked cell with its neighborhood mean.
    #[expect(clippy::cast_precision_loss)]
    pub fn impute(&self, table: &mut QTable) -> Result<ImputeReport, ImputeError> {
        let dims = table.dimensions();
        if self.index.len() > dims.states {
            return Err(ImputeError::SizeMismatch {
                points: self.index.len(),
                states: dims.states,
            });
        }

        let snapshot = table.as_slice().to_vec();
        let mut report = ImputeReport::default();
        for state in 0..self.index.len() {
            let untracked: Vec<usize> = (0..dims.actions)
                .filter(|&action| !table.is_tracked(state, action))
                .collect();
            if untracked.is_empty() {
                continue;
            }
            let neighbors = self.neighbors_of(state);
            if neighbors.is_empty() {
                continue;
            }
            for &action in &untracked {
                let total: f64 = neighbors
                    .iter()
                    .map(|&n| snapshot[dims.cell(n, action)])
                    .sum();
                table.fill_untracked(state, action, total / neighbors.len() as f64);
            }
            report.imputed_cells += untracked.len();
            report.imputed_states += 1;
        }

        log::info!(
            "imputed {} cells in {} states from {} nearest neighbors",
            report.imputed_cells,
            report.imputed_states,
            self.neighbors - 1,
        );
        Ok(report)
    }
}
