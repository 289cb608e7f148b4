pub mod report;
pub mod runner;

pub use report::{BatchReport, Outcome, TaskOutcome};
pub use runner::BatchRunner;
