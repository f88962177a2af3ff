//! Per-state action tables.
//!
//! # File Format
//!
//! A policy file lists one action per line, in ascending state order starting at state 0.
//! Actions are written **one-indexed** (`1` = pass, ..., `4` = punt):
//!
//! ```text
//! 1
//! 1
//! 4
//! ...
//! ```
//!
//! Blank lines are ignored when reading.

use std::io::{self, BufRead, Write};

/// An action index for every state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    actions: Vec<usize>,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PolicyError {
    #[display("line {line}: expected a one-indexed action, got '{content}'")]
    InvalidLine { line: usize, content: String },
    #[display("line {line}: action {action} is outside 1..={actions}")]
    ActionOutOfRange {
        line: usize,
        action: usize,
        actions: usize,
    },
    #[display("failed to read policy: {_0}")]
    Io(io::Error),
}

impl Policy {
    #[must_use]
    pub fn new(actions: Vec<usize>) -> Self {
        Self { actions }
    }

    /// Builds the greedy policy of a row-major `states × actions` value table.
    ///
    /// Ties go to the lowest action index. A table without actions has no states to
    /// choose for and yields an empty policy.
    #[must_use]
    pub fn greedy(values: &[f64], actions: usize) -> Self {
        if actions == 0 {
            return Self::new(vec![]);
        }
        Self::new(values.chunks(actions).map(first_argmax).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns the action chosen in `state`.
    #[must_use]
    pub fn action(&self, state: usize) -> Option<usize> {
        self.actions.get(state).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.actions
    }

    /// Counts how many states choose each action.
    #[must_use]
    pub fn action_counts(&self, actions: usize) -> Vec<usize> {
        let mut counts = vec![0; actions];
        for &a in &self.actions {
            if let Some(c) = counts.get_mut(a) {
                *c += 1;
            }
        }
        counts
    }

    /// Writes the policy in the one-indexed line format.
    pub fn write_to<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: Write,
    {
        for action in &self.actions {
            writeln!(writer, "{}", action + 1)?;
        }
        writer.flush()
    }

    /// Reads a policy in the one-indexed line format.
    ///
    /// Every action must lie in `1..=actions`.
    pub fn read_from<R>(reader: R, actions: usize) -> Result<Self, PolicyError>
    where
        R: BufRead,
    {
        let mut table = vec![];
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(PolicyError::Io)?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let action = trimmed
                .parse::<usize>()
                .map_err(|_| PolicyError::InvalidLine {
                    line: i + 1,
                    content: trimmed.to_owned(),
                })?;
            if action == 0 || action > actions {
                return Err(PolicyError::ActionOutOfRange {
                    line: i + 1,
                    action,
                    actions,
                });
            }
            table.push(action - 1);
        }
        Ok(Self::new(table))
    }
}

/// Index of the first maximum (lowest index wins ties).
///
/// NaN entries never win. Returns `0` for an empty slice.
#[must_use]
pub fn first_argmax(values: &[f64]) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}
