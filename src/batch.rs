//! Batch stop/clean over many units with preview and confirmation.
//!
//! Targets are deduplicated, previewed with their current state, confirmed,
//! then acted on one at a time. A failing target is reported and skipped;
//! it never stops the batch.

use crate::error::Result;
use crate::job_id::JobId;
use crate::ui::Palette;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

/// Decides whether a batch may proceed.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, question: &str) -> bool {
        self(question)
    }
}

/// Confirms everything; used for `--yes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoYes;

impl Confirm for AutoYes {
    fn confirm(&mut self, _question: &str) -> bool {
        true
    }
}

/// Asks on a writer and reads one answer line.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for LinePrompt<R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        if write!(self.output, "\n{} (y/N) ", question)
            .and_then(|_| self.output.flush())
            .is_err()
        {
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(err) => {
                warn!(error = %err, "failed to read confirmation");
                false
            }
        }
    }
}

/// Only `y` and `yes` (any case) affirm; everything else means no.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Drop repeated targets, keeping the first occurrence.
pub fn dedupe(targets: Vec<JobId>) -> Vec<JobId> {
    let mut seen = HashSet::new();
    targets
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Wording for one kind of batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchOperation {
    /// Printed when there are no targets.
    pub empty_message: &'static str,
    /// Preview heading, after the count: `Found 3 unit(s) to clean:`.
    pub found_label: &'static str,
    pub question: &'static str,
    pub progress: &'static str,
    /// Summary verb: `Cleaned 2/3 units`.
    pub done_verb: &'static str,
}

pub const CLEAN: BatchOperation = BatchOperation {
    empty_message: "No dead or failed cmd-* units to clean.",
    found_label: "unit(s) to clean",
    question: "Clean these units?",
    progress: "Cleaning units...",
    done_verb: "Cleaned",
};

pub const KILL_ALL: BatchOperation = BatchOperation {
    empty_message: "No running cmd-* units to kill.",
    found_label: "running unit(s)",
    question: "Stop ALL of these units?",
    progress: "Stopping units...",
    done_verb: "Stopped",
};

/// Aggregate counts of an executed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The batch ran; counts may include failures.
    Completed(BatchResult),
    /// Confirmation was declined; nothing was touched.
    Aborted { total: usize },
}

#[cfg(test)]
impl BatchOutcome {
    pub fn result(&self) -> BatchResult {
        match self {
            BatchOutcome::Completed(result) => *result,
            BatchOutcome::Aborted { .. } => BatchResult::default(),
        }
    }
}

/// Runs batches, printing progress to `out` and per-target failures to `err`.
pub struct BatchRunner<'a, W: Write, E: Write> {
    palette: &'a Palette,
    out: W,
    err: E,
}

impl<'a, W: Write, E: Write> BatchRunner<'a, W, E> {
    pub fn new(palette: &'a Palette, out: W, err: E) -> Self {
        Self { palette, out, err }
    }

    /// Run `action` on every distinct target.
    ///
    /// `state_of` annotates the preview and may return `None` when the state
    /// cannot be read. `confirm` is consulted once, after the preview.
    pub fn run<S, A>(
        &mut self,
        op: &BatchOperation,
        targets: Vec<JobId>,
        state_of: S,
        confirm: &mut dyn Confirm,
        mut action: A,
    ) -> io::Result<BatchOutcome>
    where
        S: Fn(&JobId) -> Option<String>,
        A: FnMut(&JobId) -> Result<()>,
    {
        let targets = dedupe(targets);
        let total = targets.len();

        if targets.is_empty() {
            writeln!(
                self.out,
                "{}",
                self.palette.success(&format!("✓ {}", op.empty_message))
            )?;
            return Ok(BatchOutcome::Completed(BatchResult::default()));
        }

        writeln!(self.out, "Found {} {}:", total, op.found_label)?;
        for id in &targets {
            let state = state_of(id).unwrap_or_else(|| "unknown".to_string());
            let label = format!("[{}]", state);
            let label = if state == "failed" {
                self.palette.failure(&label)
            } else {
                self.palette.muted(&label)
            };
            writeln!(self.out, "  {} {}", id, label)?;
        }
        self.out.flush()?;

        if !confirm.confirm(op.question) {
            writeln!(self.out, "Aborted.")?;
            info!(total, "batch aborted at confirmation");
            return Ok(BatchOutcome::Aborted { total });
        }

        writeln!(self.out, "\n{}", op.progress)?;
        let mut result = BatchResult {
            total,
            ..BatchResult::default()
        };
        for id in &targets {
            match action(id) {
                Ok(()) => result.succeeded += 1,
                Err(err) => {
                    result.failed += 1;
                    warn!(unit = %id, error = %err, "batch action failed");
                    writeln!(self.err, "{} {}", self.palette.cross(), err)?;
                }
            }
        }

        writeln!(
            self.out,
            "\n{} {} {}/{} units",
            self.palette.check(),
            op.done_verb,
            result.succeeded,
            result.total
        )?;
        Ok(BatchOutcome::Completed(result))
    }
}
