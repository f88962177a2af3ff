use playcall_mdp::{Dimensions, Transition};

use crate::EvaluateError;

/// Empirical expected payout `P[s][a]` per state-action, with visit counts.
///
/// Built from transitions as `P[s][a] = ΣR[s][a] / (n[s][a] + λ)`: the same `λ`
/// pseudo-visits the model-based reward estimate adds, so rarely observed state-actions
/// are shrunk toward zero. The table always has at least one action.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutTable {
    dims: Dimensions,
    payouts: Vec<f64>,
    visits: Vec<u32>,
}

impl PayoutTable {
    /// Creates a table from explicit `payouts[s][a]`, with no visits recorded.
    pub fn from_values(payouts: Vec<Vec<f64>>) -> Result<Self, EvaluateError> {
        let actions = payouts.first().map_or(0, Vec::len);
        if actions == 0 {
            return Err(EvaluateError::EmptyActionSpace);
        }
        let dims = Dimensions::new(payouts.len(), actions);
        let mut flat = Vec::with_capacity(dims.cells());
        for (row, values) in payouts.into_iter().enumerate() {
            if values.len() != actions {
                return Err(EvaluateError::ShapeMismatch {
                    row,
                    expected: actions,
                    actual: values.len(),
                });
            }
            flat.extend(values);
        }
        Ok(Self {
            dims,
            payouts: flat,
            visits: vec![0; dims.cells()],
        })
    }

    /// Averages the rewards of a transition batch per state-action.
    pub fn from_transitions<'a, I>(
        dims: Dimensions,
        batch: I,
        laplace: f64,
    ) -> Result<Self, EvaluateError>
    where
        I: IntoIterator<Item = &'a Transition>,
    {
        if dims.actions == 0 {
            return Err(EvaluateError::EmptyActionSpace);
        }
        if !laplace.is_finite() || laplace < 0.0 {
            return Err(EvaluateError::InvalidLaplace { laplace });
        }
        let mut sums = vec![0.0; dims.cells()];
        let mut visits = vec![0_u32; dims.cells()];
        for (index, t) in batch.into_iter().enumerate() {
            t.validate(dims)
                .map_err(|source| EvaluateError::InvalidTransition { index, source })?;
            let cell = dims.cell(t.state, t.action);
            sums[cell] += t.reward;
            visits[cell] += 1;
        }
        let payouts = sums
            .iter()
            .zip(&visits)
            .map(|(&sum, &n)| {
                let denominator = f64::from(n) + laplace;
                if denominator == 0.0 { 0.0 } else { sum / denominator }
            })
            .collect();
        Ok(Self {
            dims,
            payouts,
            visits,
        })
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    #[must_use]
    pub fn payout(&self, state: usize, action: usize) -> f64 {
        self.payouts[self.dims.cell(state, action)]
    }

    #[must_use]
    pub fn visits(&self, state: usize, action: usize) -> u32 {
        self.visits[self.dims.cell(state, action)]
    }

    /// Samples observed in `state`, over all actions.
    #[must_use]
    pub fn state_visits(&self, state: usize) -> u32 {
        (0..self.dims.actions)
            .map(|action| self.visits(state, action))
            .sum()
    }

    /// Up to `n` observed states, most visited first (lower index on ties).
    #[must_use]
    pub fn most_visited(&self, n: usize) -> Vec<usize> {
        let mut states: Vec<(usize, u32)> = (0..self.dims.states)
            .map(|state| (state, self.state_visits(state)))
            .filter(|&(_, visits)| visits > 0)
            .collect();
        states.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        states.into_iter().take(n).map(|(state, _)| state).collect()
    }

    /// Every observed state, repeated once per sample taken in it.
    #[must_use]
    pub fn visit_multiset(&self) -> Vec<usize> {
        (0..self.dims.states)
            .flat_map(|state| std::iter::repeat_n(state, self.state_visits(state) as usize))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transitions() {
        let batch = [
            Transition::new(0, 1, 3.0, 2),
            Transition::new(0, 1, 1.0, 2),
            Transition::new(1, 0, -2.0, 2),
            Transition::new(1, 1, 5.0, 0),
            Transition::new(1, 1, 1.0, 0),
            Transition::new(1, 0, 0.0, 2),
        ];
        let table = PayoutTable::from_transitions(Dimensions::new(3, 2), &batch, 1.0).unwrap();
        assert!((table.payout(0, 1) - 4.0 / 3.0).abs() < 1e-12);
        assert!((table.payout(1, 0) - -2.0 / 3.0).abs() < 1e-12);
        assert_eq!(table.payout(0, 0), 0.0);
        assert_eq!(table.visits(1, 1), 2);
        assert_eq!(table.state_visits(1), 4);
        assert_eq!(table.state_visits(2), 0);

        let raw = PayoutTable::from_transitions(Dimensions::new(3, 2), &batch, 0.0).unwrap();
        assert!((raw.payout(0, 1) - 2.0).abs() < 1e-12);
        assert_eq!(raw.payout(2, 0), 0.0);
    }

    #[test]
    fn test_most_visited_and_multiset() {
        let batch = [
            Transition::new(2, 0, 0.0, 0),
            Transition::new(1, 0, 0.0, 0),
            Transition::new(2, 1, 0.0, 0),
            Transition::new(0, 0, 0.0, 0),
            Transition::new(3, 0, 0.0, 0),
        ];
        let table = PayoutTable::from_transitions(Dimensions::new(5, 2), &batch, 1.0).unwrap();
        assert_eq!(table.most_visited(3), vec![2, 0, 1]);
        assert_eq!(table.most_visited(10), vec![2, 0, 1, 3]);
        assert_eq!(table.visit_multiset(), vec![0, 1, 2, 2, 3]);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            PayoutTable::from_values(vec![vec![1.0, 2.0], vec![3.0]]),
            Err(EvaluateError::ShapeMismatch {
                row: 1,
                expected: 2,
                actual: 1
            })
        );
        let batch = [Transition::new(0, 0, 1.0, 9)];
        assert!(matches!(
            PayoutTable::from_transitions(Dimensions::new(2, 2), &batch, 1.0),
            Err(EvaluateError::InvalidTransition { index: 0, .. })
        ));
        assert!(matches!(
            PayoutTable::from_transitions(Dimensions::new(2, 2), &batch, f64::NAN),
            Err(EvaluateError::InvalidLaplace { .. })
        ));
    }

    #[test]
    fn test_empty_action_space_is_rejected() {
        assert_eq!(
            PayoutTable::from_values(vec![vec![], vec![]]),
            Err(EvaluateError::EmptyActionSpace)
        );
        assert_eq!(
            PayoutTable::from_values(vec![]),
            Err(EvaluateError::EmptyActionSpace)
        );
        assert_eq!(
            PayoutTable::from_transitions(Dimensions::new(2, 0), &Vec::<Transition>::new(), 1.0),
            Err(EvaluateError::EmptyActionSpace)
        );
    }
}
