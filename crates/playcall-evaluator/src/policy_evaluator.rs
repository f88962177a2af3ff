use playcall_mdp::Policy;
use rand::Rng;

use crate::{EvaluateError, payout::PayoutTable};

/// Baseline scores over one state sample.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BaselineScores {
    /// Uniform-random action, drawn afresh for every sampled state
    pub random: f64,
    /// Always the same action, indexed by action
    pub constant: Vec<f64>,
}

impl BaselineScores {
    /// Scores in report order: random first, then each constant action.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        std::iter::once(self.random)
            .chain(self.constant.iter().copied())
            .collect()
    }
}

/// Scores policies by their mean payout over a sample of states.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    payouts: PayoutTable,
}

impl PolicyEvaluator {
    #[must_use]
    pub fn new(payouts: PayoutTable) -> Self {
        Self { payouts }
    }

    #[must_use]
    pub fn payouts(&self) -> &PayoutTable {
        &self.payouts
    }

    /// Mean of `P[s][π[s]]` over `states` (duplicates count once per occurrence).
    pub fn evaluate_policy(&self, policy: &Policy, states: &[usize]) -> Result<f64, EvaluateError> {
        self.check_sample(states)?;
        let actions = self.payouts.dimensions().actions;
        let mut total = 0.0;
        for &state in states {
            let action = policy.action(state).ok_or(EvaluateError::PolicyTooShort {
                state,
                len: policy.len(),
            })?;
            if action >= actions {
                return Err(EvaluateError::ActionOutOfRange {
                    state,
                    action,
                    actions,
                });
            }
            total += self.payouts.payout(state, action);
        }
        Ok(mean(total, states.len()))
    }

    /// Scores the random baseline and every constant-action baseline over `states`.
    pub fn evaluate_baselines<R>(
        &self,
        states: &[usize],
        rng: &mut R,
    ) -> Result<BaselineScores, EvaluateError>
    where
        R: Rng + ?Sized,
    {
        self.check_sample(states)?;
        let actions = self.payouts.dimensions().actions;
        let mut random = 0.0;
        let mut constant = vec![0.0; actions];
        for &state in states {
            random += self.payouts.payout(state, rng.random_range(0..actions));
            for (action, total) in constant.iter_mut().enumerate() {
                *total += self.payouts.payout(state, action);
            }
        }
        Ok(BaselineScores {
            random: mean(random, states.len()),
            constant: constant
                .into_iter()
                .map(|total| mean(total, states.len()))
                .collect(),
        })
    }

    fn check_sample(&self, states: &[usize]) -> Result<(), EvaluateError> {
        if states.is_empty() {
            return Err(EvaluateError::EmptySample);
        }
        let dims = self.payouts.dimensions();
        if let Some(&state) = states.iter().find(|&&s| s >= dims.states) {
            return Err(EvaluateError::StateOutOfRange {
                state,
                states: dims.states,
            });
        }
        Ok(())
    }
}

#[expect(clippy::cast_precision_loss)]
fn mean(total: f64, count: usize) -> f64 {
    total / count as f64
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn evaluator() -> PolicyEvaluator {
        PolicyEvaluator::new(PayoutTable::from_values(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap())
    }

    #[test]
    fn test_evaluate_policy() {
        let score = evaluator()
            .evaluate_policy(&Policy::new(vec![1, 0]), &[0, 1])
            .unwrap();
        assert!((score - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_states_are_weighted() {
        let score = evaluator()
            .evaluate_policy(&Policy::new(vec![0, 1]), &[1, 1, 1, 0])
            .unwrap();
        assert!((score - 13.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_baselines() {
        let mut rng = Pcg32::seed_from_u64(7);
        let scores = evaluator().evaluate_baselines(&[0, 1], &mut rng).unwrap();
        assert_eq!(scores.constant, vec![2.0, 3.0]);
        // any mix of draws lands between the smallest and largest payouts
        assert!((1.0..=4.0).contains(&scores.random));
        assert_eq!(scores.to_vec().len(), 3);
        assert_eq!(scores.to_vec()[1..], [2.0, 3.0]);
    }

    #[test]
    fn test_random_baseline_is_reproducible_with_seed() {
        let states = [0, 1, 1, 0, 1, 0, 0, 1];
        let a = evaluator()
            .evaluate_baselines(&states, &mut Pcg32::seed_from_u64(42))
            .unwrap();
        let b = evaluator()
            .evaluate_baselines(&states, &mut Pcg32::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_baseline_averages_actions() {
        // every state pays 1 for action 0 and 3 for action 1
        let payouts = PayoutTable::from_values(vec![vec![1.0, 3.0]; 4]).unwrap();
        let states: Vec<usize> = (0..20_000).map(|i| i % 4).collect();
        let mut rng = Pcg32::seed_from_u64(1);
        let scores = PolicyEvaluator::new(payouts)
            .evaluate_baselines(&states, &mut rng)
            .unwrap();
        assert!((scores.random - 2.0).abs() < 0.05, "{}", scores.random);
    }

    #[test]
    fn test_invalid_samples() {
        let evaluator = evaluator();
        let policy = Policy::new(vec![0, 1]);
        assert_eq!(
            evaluator.evaluate_policy(&policy, &[]),
            Err(EvaluateError::EmptySample)
        );
        assert_eq!(
            evaluator.evaluate_baselines(&[], &mut Pcg32::seed_from_u64(0)),
            Err(EvaluateError::EmptySample)
        );
        assert_eq!(
            evaluator.evaluate_policy(&policy, &[0, 2]),
            Err(EvaluateError::StateOutOfRange { state: 2, states: 2 })
        );
        assert_eq!(
            evaluator.evaluate_policy(&Policy::new(vec![0]), &[1]),
            Err(EvaluateError::PolicyTooShort { state: 1, len: 1 })
        );
        assert_eq!(
            evaluator.evaluate_policy(&Policy::new(vec![0, 5]), &[1]),
            Err(EvaluateError::ActionOutOfRange {
                state: 1,
                action: 5,
                actions: 2
            })
        );
    }
}
