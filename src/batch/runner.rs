use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::batch::report::{BatchReport, Outcome, TaskOutcome};
use crate::config::{Config, FailurePolicy};
use crate::task::ExtractionTask;
use crate::tool::Extractor;

#[derive(Debug)]
pub struct BatchRunner {
    tasks: Vec<ExtractionTask>,
    config: Config,
}

impl BatchRunner {
    pub fn new(config: Config) -> Self {
        let tasks = config.tasks();
        BatchRunner { tasks, config }
    }

    pub fn tasks(&self) -> &[ExtractionTask] {
        &self.tasks
    }

    /// Runs every task in order, one at a time, and times each extraction.
    pub fn run<E: Extractor>(&self, extractor: &mut E) -> BatchReport {
        let window = self.config.window();
        let stations = self.config.stations();

        if !stations.exists() {
            warn!(stations = %stations.display(), "Station list not found, running anyway");
        }

        info!(
            tasks = self.tasks.len(),
            window = %window,
            stations = %stations.display(),
            "Starting batch extraction"
        );

        let mut report = BatchReport::new();
        let mut aborted = false;

        for (index, task) in self.tasks.iter().enumerate() {
            if aborted {
                report.push(TaskOutcome {
                    variable: task.variable(),
                    output: task.output().to_path_buf(),
                    outcome: Outcome::Skipped,
                    elapsed: Duration::ZERO,
                });
                continue;
            }

            info!(
                "[{}/{}] Extracting {} to {}",
                index + 1,
                self.tasks.len(),
                task.variable(),
                task.output().display()
            );

            let invocation = task.invocation(stations, window);
            let started = Instant::now();
            let outcome = Outcome::from_result(extractor.extract(&invocation));
            let elapsed = started.elapsed();

            match &outcome {
                Outcome::Succeeded => {
                    info!(variable = %task.variable(), "✓ Done in {:.2?}", elapsed)
                }
                Outcome::Failed(status) => {
                    warn!(variable = %task.variable(), "✗ Extractor exited with {} after {:.2?}", status, elapsed)
                }
                other => {
                    error!(variable = %task.variable(), "✗ {} after {:.2?}", other, elapsed)
                }
            }

            if outcome.is_failure() && self.config.on_failure() == FailurePolicy::Abort {
                error!("Aborting batch after failed extraction of {}", task.variable());
                aborted = true;
            }

            report.push(TaskOutcome {
                variable: task.variable(),
                output: task.output().to_path_buf(),
                outcome,
                elapsed,
            });
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Batch finished in {:.2?}",
            report.total_elapsed()
        );

        report
    }
}
