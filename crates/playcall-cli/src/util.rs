use std::{
    fs::File,
    io::{self, BufReader, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use playcall_mdp::{Action, Dimensions, Policy, Transition};

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }

    /// Writes `policy` in the one-indexed, one-action-per-line format.
    pub fn write_policy(&mut self, policy: &Policy) -> anyhow::Result<()> {
        policy
            .write_to(&mut *self)
            .with_context(|| format!("Failed to write policy to {}", self.display_path()))?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Reads one transition batch per file, in the order given.
pub fn read_transition_files(paths: &[PathBuf]) -> anyhow::Result<Vec<Vec<Transition>>> {
    paths
        .iter()
        .map(|path| {
            let batch: Vec<Transition> = read_json_file("transitions", path)?;
            eprintln!("Loaded {} transitions from {}", batch.len(), path.display());
            Ok(batch)
        })
        .collect()
}

/// Reads a one-indexed policy file for a table with `dims.actions` actions.
pub fn read_policy_file<P>(path: P, dims: Dimensions) -> anyhow::Result<Policy>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open policy file: {}", path.display()))?;
    let policy = Policy::read_from(BufReader::new(file), dims.actions)
        .with_context(|| format!("Failed to parse policy file: {}", path.display()))?;
    if policy.len() != dims.states {
        log::warn!(
            "policy file {} covers {} states, the table has {}",
            path.display(),
            policy.len(),
            dims.states,
        );
    }
    Ok(policy)
}

pub fn print_action_counts(counts: &[usize]) {
    eprintln!("  Policy actions:");
    for (action, count) in Action::ALL.iter().zip(counts) {
        eprintln!("    {:<10} {count:>6}", action.to_string());
    }
}
