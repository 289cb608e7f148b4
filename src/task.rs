use std::path::{Path, PathBuf};

use crate::config::TimeWindow;
use crate::tool::Invocation;
use crate::variables::Variable;

/// One variable to extract and the file it goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTask {
    variable: Variable,
    output: PathBuf,
}

impl ExtractionTask {
    pub fn new(variable: Variable, output_directory: &Path) -> Self {
        Self {
            variable,
            output: output_directory.join(variable.file_name()),
        }
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn invocation(&self, stations: &Path, window: &TimeWindow) -> Invocation {
        Invocation {
            stations: stations.to_path_buf(),
            variable: self.variable,
            output: self.output.clone(),
            start: window.start_str(),
            end: window.end_str(),
        }
    }
}
