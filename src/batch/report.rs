use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::tool::{ToolError, ToolStatus};
use crate::variables::Variable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(ToolStatus),
    NotStarted(String),
    TimedOut(Duration),
    Errored(String),
    Skipped,
}

impl Outcome {
    pub fn from_result(result: Result<ToolStatus, ToolError>) -> Self {
        match result {
            Ok(status) if status.success() => Outcome::Succeeded,
            Ok(status) => Outcome::Failed(status),
            Err(ToolError::Timeout(timeout)) => Outcome::TimedOut(timeout),
            Err(e @ ToolError::Spawn { .. }) => Outcome::NotStarted(e.to_string()),
            Err(e @ ToolError::Wait(_)) => Outcome::Errored(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, Outcome::Succeeded | Outcome::Skipped)
    }

    /// Status a shell would report after running this step.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Succeeded | Outcome::Skipped => 0,
            Outcome::Failed(status) => status.code().unwrap_or(1),
            Outcome::NotStarted(_) => 127,
            Outcome::TimedOut(_) => 124,
            Outcome::Errored(_) => 1,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Succeeded => write!(f, "ok"),
            Outcome::Failed(status) => write!(f, "failed ({})", status),
            Outcome::NotStarted(msg) => write!(f, "not started ({})", msg),
            Outcome::TimedOut(timeout) => write!(f, "timed out after {:?}", timeout),
            Outcome::Errored(msg) => write!(f, "error ({})", msg),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub variable: Variable,
    pub output: PathBuf,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    outcomes: Vec<TaskOutcome>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: TaskOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|t| t.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|t| t.outcome.is_failure())
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|t| t.outcome == Outcome::Skipped)
            .count()
    }

    pub fn total_elapsed(&self) -> Duration {
        self.outcomes.iter().map(|t| t.elapsed).sum()
    }

    /// Exit code of the last task that actually ran, 0 if none did.
    pub fn exit_code(&self) -> i32 {
        self.outcomes
            .iter()
            .rev()
            .find(|t| t.outcome != Outcome::Skipped)
            .map_or(0, |t| t.outcome.exit_code())
    }

    /// `exit_code` narrowed to a process status; codes outside 0..=255 become 1.
    pub fn process_exit_code(&self) -> u8 {
        u8::try_from(self.exit_code()).unwrap_or(1)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .outcomes
            .iter()
            .map(|t| t.variable.as_str().len())
            .max()
            .unwrap_or(0);

        for task in &self.outcomes {
            writeln!(
                f,
                "  {:<width$}  {:>10.1?}  {}",
                task.variable.as_str(),
                task.elapsed,
                task.outcome,
                width = width
            )?;
        }

        write!(
            f,
            "Tasks: {}, succeeded: {}, failed: {}, skipped: {}, total time: {:.1?}",
            self.outcomes.len(),
            self.succeeded(),
            self.failed(),
            self.skipped(),
            self.total_elapsed()
        )
    }
}
