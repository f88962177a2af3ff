use std::path::PathBuf;

use anyhow::Context;
use playcall_mdp::Action;
use playcall_solver::{
    imputer::{ImputerParams, NeighborImputer},
    q_learning::{QLearningEstimator, QLearningParams, QTable},
};

use crate::util::{self, Output};

const DEFAULT_PASSES: usize = 10;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct QLearningArg {
    /// Transition JSON files, learned from in the order given
    #[arg(required = true)]
    input: Vec<PathBuf>,
    /// Discount factor
    #[arg(long, default_value_t = QLearningParams::default().discount)]
    discount: f64,
    /// Learning rate
    #[arg(long, default_value_t = QLearningParams::default().learning_rate)]
    learning_rate: f64,
    /// Passes over each file
    #[arg(long, default_value_t = DEFAULT_PASSES)]
    passes: usize,
    /// Neighbor count for imputation, including the state itself
    #[arg(long, default_value_t = ImputerParams::default().neighbors)]
    neighbors: usize,
    /// Keep unobserved state-actions at zero instead of imputing them
    #[arg(long)]
    no_impute: bool,
    /// Policy output file (one-indexed action per line)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &QLearningArg) -> anyhow::Result<()> {
    let QLearningArg {
        input,
        discount,
        learning_rate,
        passes,
        neighbors,
        no_impute,
        output,
    } = arg;

    let estimator = QLearningEstimator::new(QLearningParams {
        discount: *discount,
        learning_rate: *learning_rate,
    })?;
    let imputer = if *no_impute {
        None
    } else {
        Some(NeighborImputer::football(ImputerParams {
            neighbors: *neighbors,
        })?)
    };

    let mut table = QTable::football();
    for (path, batch) in input.iter().zip(util::read_transition_files(input)?) {
        eprintln!("Learning from {} ({passes} passes)...", path.display());
        estimator
            .train(&mut table, &batch, *passes)
            .with_context(|| format!("Failed to learn from {}", path.display()))?;
    }
    let tracked = table.tracked_cells();

    let imputed = match &imputer {
        Some(imputer) => {
            eprintln!("Imputing unobserved state-actions...");
            imputer.impute(&mut table)?.imputed_cells
        }
        None => 0,
    };
    let policy = table.greedy_policy();

    eprintln!("Q-Learning Report:");
    eprintln!("  Files:          {}", input.len());
    eprintln!("  Tracked cells:  {tracked}");
    eprintln!("  Imputed cells:  {imputed}");
    util::print_action_counts(&policy.action_counts(Action::ALL.len()));

    let mut output = Output::from_output_path(output.clone())?;
    output.write_policy(&policy)?;
    eprintln!("Policy saved to {}", output.display_path());
    Ok(())
}
