use std::{collections::BTreeSet, path::PathBuf};

use chrono::{DateTime, Utc};
use playcall_mdp::{Action, TERMINAL_STATE, Transition};
use playcall_stats::{descriptive::DescriptiveStats, percentiles::Percentiles};

use crate::util::{self, Output};

const QUARTILES: [f64; 3] = [25.0, 50.0, 75.0];

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SummarizeArg {
    /// Transition JSON files
    #[arg(required = true)]
    input: Vec<PathBuf>,
    /// Report output file (JSON); stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, serde::Serialize)]
struct SummaryReport {
    generated_at: DateTime<Utc>,
    files: Vec<FileSummary>,
    total: BatchSummary,
}

#[derive(Debug, Clone, serde::Serialize)]
struct FileSummary {
    path: PathBuf,
    #[serde(flatten)]
    summary: BatchSummary,
}

#[derive(Debug, Clone, serde::Serialize)]
struct BatchSummary {
    transitions: usize,
    distinct_states: usize,
    terminal_transitions: usize,
    actions: Vec<ActionCount>,
    reward: Option<RewardSummary>,
}

#[derive(Debug, Clone, serde::Serialize)]
struct ActionCount {
    action: Action,
    count: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
struct RewardSummary {
    mean: f64,
    median: f64,
    std_dev: f64,
    min: f64,
    max: f64,
    /// `(percentile, value)` pairs
    quartiles: Vec<(f64, f64)>,
}

impl BatchSummary {
    fn new(batch: &[Transition]) -> Self {
        let rewards: Vec<f64> = batch.iter().map(|t| t.reward).collect();
        let reward = DescriptiveStats::new(rewards.iter().copied()).map(|stats| RewardSummary {
            mean: stats.mean,
            median: stats.median,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
            quartiles: Percentiles::new(&rewards, &QUARTILES).iter().collect(),
        });
        let actions = Action::ALL
            .iter()
            .map(|&action| ActionCount {
                action,
                count: batch.iter().filter(|t| t.action == action.index()).count(),
            })
            .collect();
        Self {
            transitions: batch.len(),
            distinct_states: batch.iter().map(|t| t.state).collect::<BTreeSet<_>>().len(),
            terminal_transitions: batch
                .iter()
                .filter(|t| t.next_state == TERMINAL_STATE)
                .count(),
            actions,
            reward,
        }
    }

    fn print(&self, title: &str) {
        eprintln!("{title}:");
        eprintln!("  Transitions:     {}", self.transitions);
        eprintln!("  Distinct states: {}", self.distinct_states);
        eprintln!("  Drive endings:   {}", self.terminal_transitions);
        for ActionCount { action, count } in &self.actions {
            eprintln!("  {:<16} {count}", format!("{action}:"));
        }
        if let Some(reward) = &self.reward {
            eprintln!(
                "  Reward:          mean {:.4}, median {:.4}, std dev {:.4}, range [{:.4}, {:.4}]",
                reward.mean, reward.median, reward.std_dev, reward.min, reward.max
            );
        }
    }
}

pub(crate) fn run(arg: &SummarizeArg) -> anyhow::Result<()> {
    let SummarizeArg { input, output } = arg;

    let batches = util::read_transition_files(input)?;
    let files: Vec<FileSummary> = input
        .iter()
        .zip(&batches)
        .map(|(path, batch)| FileSummary {
            path: path.clone(),
            summary: BatchSummary::new(batch),
        })
        .collect();
    let all: Vec<Transition> = batches.into_iter().flatten().collect();
    let total = BatchSummary::new(&all);

    for file in &files {
        file.summary.print(&file.path.display().to_string());
    }
    if files.len() > 1 {
        total.print("Total");
    }

    let report = SummaryReport {
        generated_at: Utc::now(),
        files,
        total,
    };
    Output::save_json(&report, output.clone())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_summary() {
        let batch = [
            Transition::new(10, 0, 1.0, 11),
            Transition::new(11, 1, -0.5, TERMINAL_STATE),
            Transition::new(10, 0, 2.5, 12),
            Transition::new(12, 3, 0.0, TERMINAL_STATE),
        ];
        let summary = BatchSummary::new(&batch);
        assert_eq!(summary.transitions, 4);
        assert_eq!(summary.distinct_states, 3);
        assert_eq!(summary.terminal_transitions, 2);
        let counts: Vec<usize> = summary.actions.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![2, 1, 0, 1]);
        let reward = summary.reward.unwrap();
        assert!((reward.mean - 0.75).abs() < 1e-12);
        assert_eq!(reward.min, -0.5);
        assert_eq!(reward.quartiles[1], (50.0, 1.0));
    }

    #[test]
    fn test_empty_batch_has_no_reward_summary() {
        let summary = BatchSummary::new(&[]);
        assert_eq!(summary.transitions, 0);
        assert!(summary.reward.is_none());
    }
}
