use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use playcall_evaluator::{
    payout::PayoutTable,
    policy_evaluator::{BaselineScores, PolicyEvaluator},
    trial::{TrialParams, TrialRunner},
};
use playcall_mdp::Dimensions;
use playcall_solver::model::ModelParams;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::util::{self, Output};

const DEFAULT_SAMPLE_STATES: usize = 100;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Policy file to score (one-indexed action per line)
    #[arg(long)]
    policy: PathBuf,
    /// Transition JSON files the payout table is built from
    #[arg(required = true)]
    input: Vec<PathBuf>,
    /// Laplace pseudo-visit count in the payout divisor
    #[arg(long, default_value_t = ModelParams::default().laplace)]
    laplace: f64,
    /// Score over this many most-visited states
    #[arg(long, default_value_t = DEFAULT_SAMPLE_STATES)]
    states: usize,
    /// Monte-Carlo trials against the random baseline
    #[arg(long, default_value_t = TrialParams::default().trials)]
    trials: usize,
    /// States drawn per trial
    #[arg(long, default_value_t = TrialParams::default().states_per_trial)]
    states_per_trial: usize,
    /// Seed for the random baseline and trial draws
    #[arg(long)]
    seed: Option<u64>,
    /// Report output file (JSON); stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, serde::Serialize)]
struct EvaluationReport {
    generated_at: DateTime<Utc>,
    policy: PathBuf,
    sample_states: Vec<usize>,
    policy_score: f64,
    baselines: BaselineScores,
    trials: Option<TrialReport>,
}

#[derive(Debug, Clone, serde::Serialize)]
struct TrialReport {
    trials: usize,
    states_per_trial: usize,
    wins: usize,
    win_rate: f64,
    policy_mean: f64,
    policy_std_dev: f64,
    random_mean: f64,
    random_std_dev: f64,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        policy,
        input,
        laplace,
        states,
        trials,
        states_per_trial,
        seed,
        output,
    } = arg;

    let dims = Dimensions::FOOTBALL;
    let batch: Vec<_> = util::read_transition_files(input)?
        .into_iter()
        .flatten()
        .collect();
    let payouts = PayoutTable::from_transitions(dims, &batch, *laplace)
        .context("Failed to build payout table")?;
    let policy_table = util::read_policy_file(policy, dims)?;
    let evaluator = PolicyEvaluator::new(payouts);

    let mut rng = match seed {
        Some(seed) => Pcg32::seed_from_u64(*seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    };

    let sample = evaluator.payouts().most_visited(*states);
    eprintln!("Scoring policy over {} most visited states...", sample.len());
    let policy_score = evaluator
        .evaluate_policy(&policy_table, &sample)
        .context("Failed to score policy")?;
    let baselines = evaluator
        .evaluate_baselines(&sample, &mut rng)
        .context("Failed to score baselines")?;

    let trials = if *trials == 0 {
        None
    } else {
        let runner = TrialRunner::new(TrialParams {
            trials: *trials,
            states_per_trial: *states_per_trial,
        });
        eprintln!("Running {trials} trials of {states_per_trial} states...");
        let summary = runner
            .run(&evaluator, &policy_table, &mut rng)
            .context("Failed to run trials")?;
        let policy_stats = summary.policy_stats();
        let random_stats = summary.random_stats();
        Some(TrialReport {
            trials: summary.trials(),
            states_per_trial: *states_per_trial,
            wins: summary.wins,
            win_rate: summary.win_rate(),
            policy_mean: policy_stats.as_ref().map_or(f64::NAN, |s| s.mean),
            policy_std_dev: policy_stats.as_ref().map_or(f64::NAN, |s| s.std_dev),
            random_mean: random_stats.as_ref().map_or(f64::NAN, |s| s.mean),
            random_std_dev: random_stats.as_ref().map_or(f64::NAN, |s| s.std_dev),
        })
    };

    eprintln!("Evaluation Report:");
    eprintln!("  Policy:          {policy_score:.4}");
    eprintln!("  Random:          {:.4}", baselines.random);
    for (action, score) in playcall_mdp::Action::ALL.iter().zip(&baselines.constant) {
        eprintln!("  Always {:<9} {score:.4}", action.to_string());
    }
    if let Some(trials) = &trials {
        eprintln!(
            "  Trials won:      {}/{} (Monte-Carlo comparison, not a significance test)",
            trials.wins, trials.trials
        );
    }

    let report = EvaluationReport {
        generated_at: Utc::now(),
        policy: policy.clone(),
        sample_states: sample,
        policy_score,
        baselines,
        trials,
    };
    Output::save_json(&report, output.clone())?;
    Ok(())
}
