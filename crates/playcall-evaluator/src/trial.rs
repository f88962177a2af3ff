//! Repeated comparison of a policy against the uniform-random baseline.
//!
//! Each trial draws `states_per_trial` states, with replacement, from the visit-weighted
//! multiset of observed states (a state sampled `n` times in the logs is `n` times as
//! likely to be drawn), then scores the policy and the random baseline on that same draw.
//! A trial is a win when the policy scores strictly higher.
//!
//! The win count is a Monte-Carlo comparison. It is not a statistical significance
//! test: trials share one payout table and are not independent estimates of anything
//! beyond it.

use playcall_mdp::Policy;
use playcall_stats::descriptive::DescriptiveStats;
use rand::{Rng, seq::IndexedRandom as _};

use crate::{EvaluateError, policy_evaluator::PolicyEvaluator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialParams {
    pub trials: usize,
    pub states_per_trial: usize,
}

impl Default for TrialParams {
    fn default() -> Self {
        Self {
            trials: 30,
            states_per_trial: 100,
        }
    }
}

/// Score series of a trial run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TrialSummary {
    pub policy_scores: Vec<f64>,
    pub random_scores: Vec<f64>,
    /// Trials in which the policy beat the random baseline
    pub wins: usize,
}

impl TrialSummary {
    #[must_use]
    pub fn trials(&self) -> usize {
        self.policy_scores.len()
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.trials() == 0 {
            return 0.0;
        }
        self.wins as f64 / self.trials() as f64
    }

    #[must_use]
    pub fn policy_stats(&self) -> Option<DescriptiveStats> {
        DescriptiveStats::new(self.policy_scores.iter().copied())
    }

    #[must_use]
    pub fn random_stats(&self) -> Option<DescriptiveStats> {
        DescriptiveStats::new(self.random_scores.iter().copied())
    }
}

#[derive(Debug, Clone)]
pub struct TrialRunner {
    params: TrialParams,
}

impl TrialRunner {
    #[must_use]
    pub fn new(params: TrialParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn params(&self) -> &TrialParams {
        &self.params
    }

    pub fn run<R>(
        &self,
        evaluator: &PolicyEvaluator,
        policy: &Policy,
        rng: &mut R,
    ) -> Result<TrialSummary, EvaluateError>
    where
        R: Rng + ?Sized,
    {
        let population = evaluator.payouts().visit_multiset();
        if population.is_empty() || self.params.states_per_trial == 0 {
            return Err(EvaluateError::EmptySample);
        }

        let mut summary = TrialSummary {
            policy_scores: Vec::with_capacity(self.params.trials),
            random_scores: Vec::with_capacity(self.params.trials),
            wins: 0,
        };
        for trial in 0..self.params.trials {
            let sample: Vec<usize> = (0..self.params.states_per_trial)
                .filter_map(|_| population.choose(rng).copied())
                .collect();
            let policy_score = evaluator.evaluate_policy(policy, &sample)?;
            let random_score = evaluator.evaluate_baselines(&sample, rng)?.random;
            if policy_score > random_score {
                summary.wins += 1;
            }
            log::debug!(
                "trial {}/{}: policy {policy_score:.4}, random {random_score:.4}",
                trial + 1,
                self.params.trials,
            );
            summary.policy_scores.push(policy_score);
            summary.random_scores.push(random_score);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use playcall_mdp::{Dimensions, Transition};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::payout::PayoutTable;

    /// Action 1 always pays more than action 0.
    fn evaluator() -> PolicyEvaluator {
        let mut batch = vec![];
        for state in 0..4 {
            batch.push(Transition::new(state, 0, -1.0, 4));
            batch.push(Transition::new(state, 1, 2.0, 4));
        }
        PolicyEvaluator::new(
            PayoutTable::from_transitions(Dimensions::new(5, 2), &batch, 0.0).unwrap(),
        )
    }

    #[test]
    fn test_dominant_policy_wins_most_trials() {
        let runner = TrialRunner::new(TrialParams {
            trials: 20,
            states_per_trial: 50,
        });
        let mut rng = Pcg32::seed_from_u64(3);
        let best = Policy::new(vec![1; 5]);
        let summary = runner.run(&evaluator(), &best, &mut rng).unwrap();
        assert_eq!(summary.trials(), 20);
        assert!(summary.policy_scores.iter().all(|&s| (s - 2.0).abs() < 1e-12));
        // the random baseline only ties when every draw picks action 1
        assert!(summary.wins >= 19);
        assert!(summary.win_rate() > 0.9);
        assert!(summary.random_stats().unwrap().mean < 2.0);
    }

    #[test]
    fn test_worst_policy_never_wins() {
        let runner = TrialRunner::new(TrialParams::default());
        let mut rng = Pcg32::seed_from_u64(11);
        let worst = Policy::new(vec![0; 5]);
        let summary = runner.run(&evaluator(), &worst, &mut rng).unwrap();
        assert_eq!(summary.trials(), 30);
        assert_eq!(summary.wins, 0);
        assert_eq!(summary.policy_stats().unwrap().max, -1.0);
    }

    #[test]
    fn test_requires_observed_states() {
        let payouts = PayoutTable::from_values(vec![vec![1.0, 2.0]]).unwrap();
        let runner = TrialRunner::new(TrialParams::default());
        let result = runner.run(
            &PolicyEvaluator::new(payouts),
            &Policy::new(vec![0]),
            &mut Pcg32::seed_from_u64(0),
        );
        assert_eq!(result, Err(EvaluateError::EmptySample));
    }
}
