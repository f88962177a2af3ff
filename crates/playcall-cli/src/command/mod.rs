use clap::{Parser, Subcommand};

use self::{
    evaluate::EvaluateArg, q_learning::QLearningArg, summarize::SummarizeArg,
    value_iteration::ValueIterationArg,
};

mod evaluate;
mod q_learning;
mod summarize;
mod value_iteration;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log more detail to stderr (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Estimate a smoothed model from transitions and solve it with value iteration
    ValueIteration(#[clap(flatten)] ValueIterationArg),
    /// Learn a Q-table from transitions and impute unobserved state-actions
    QLearning(#[clap(flatten)] QLearningArg),
    /// Score a policy file against empirical payouts and baseline strategies
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Summarize the rewards and visits of transition files
    Summarize(#[clap(flatten)] SummarizeArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    crate::logger::init(args.verbose, args.quiet);
    match args.mode {
        Mode::ValueIteration(arg) => value_iteration::run(&arg)?,
        Mode::QLearning(arg) => q_learning::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::Summarize(arg) => summarize::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags() {
        let args =
            CommandArgs::try_parse_from(["playcall", "q-learning", "a.json", "b.json", "-vv"])
                .unwrap();
        assert_eq!(args.verbose, 2);
        assert!(!args.quiet);
        assert!(matches!(args.mode, Mode::QLearning(_)));

        assert!(CommandArgs::try_parse_from(["playcall", "value-iteration"]).is_err());
    }
}
