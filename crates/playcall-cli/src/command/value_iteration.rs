use std::path::PathBuf;

use anyhow::Context;
use playcall_mdp::Action;
use playcall_solver::{
    model::{EmpiricalModelEstimator, ModelParams},
    value_iteration::{ValueIterationParams, ValueIterationSolver},
};

use crate::util::{self, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ValueIterationArg {
    /// Transition JSON files; all of them form one batch
    #[arg(required = true)]
    input: Vec<PathBuf>,
    /// Laplace pseudo-count added to every transition and reward estimate
    #[arg(long, default_value_t = ModelParams::default().laplace)]
    laplace: f64,
    /// Discount factor
    #[arg(long, default_value_t = ValueIterationParams::default().discount)]
    discount: f64,
    /// Stop once no state value changes by this much or more
    #[arg(long, default_value_t = ValueIterationParams::default().threshold)]
    threshold: f64,
    #[arg(long, default_value_t = ValueIterationParams::default().max_iterations)]
    max_iterations: usize,
    /// Policy output file (one-indexed action per line)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also write the state values as a JSON array
    #[arg(long)]
    values: Option<PathBuf>,
}

pub(crate) fn run(arg: &ValueIterationArg) -> anyhow::Result<()> {
    let ValueIterationArg {
        input,
        laplace,
        discount,
        threshold,
        max_iterations,
        output,
        values,
    } = arg;

    let batch: Vec<_> = util::read_transition_files(input)?
        .into_iter()
        .flatten()
        .collect();

    eprintln!("Estimating model from {} transitions...", batch.len());
    let model = EmpiricalModelEstimator::football(ModelParams { laplace: *laplace })?
        .estimate(&batch)
        .context("Failed to estimate transition model")?;
    eprintln!("Observed {} state-action pairs", model.observed_cells());

    let solver = ValueIterationSolver::new(ValueIterationParams {
        discount: *discount,
        threshold: *threshold,
        max_iterations: *max_iterations,
    })?;
    eprintln!("Running value iteration...");
    let solution = solver.solve(&model)?;

    eprintln!("Value Iteration Report:");
    eprintln!("  Sweeps:      {}", solution.iterations());
    eprintln!("  Final delta: {:.6}", solution.final_delta());
    eprintln!("  Converged:   {}", solution.converged());
    util::print_action_counts(&solution.policy().action_counts(Action::ALL.len()));

    if let Some(path) = values {
        Output::save_json(&solution.values(), Some(path.clone()))?;
        eprintln!("Values saved to {}", path.display());
    }
    let mut output = Output::from_output_path(output.clone())?;
    output.write_policy(solution.policy())?;
    eprintln!("Policy saved to {}", output.display_path());
    Ok(())
}
