use crate::config::time_window::TimeWindowError;
use crate::variables::Variable;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    TimeWindow(#[from] TimeWindowError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("variables cannot be empty")]
    NoVariables,
    #[error("variable {0} is listed more than once")]
    DuplicateVariable(Variable),
    #[error("tool.program cannot be empty")]
    EmptyProgram,
    #[error("tool.timeout_secs should be greater than 0")]
    Timeout,
}
