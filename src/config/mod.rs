use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::task::ExtractionTask;
use crate::variables::Variable;

pub mod error;
pub use error::ConfigError;

pub mod time_window;
pub use time_window::TimeWindow;

pub const DEFAULT_STATIONS: &str = "stations.csv";
pub const DEFAULT_PROGRAM: &str = "python3";
pub const DEFAULT_SCRIPT: &str = "NORA3_ERA5.py";
pub const SUNPOINT_START: &str = "2016-01-01T00:00";
pub const SUNPOINT_END: &str = "2020-12-31T23:00";

/// What to do with the remaining tasks once an invocation has failed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abort,
}

/// Command line used to start the extractor, before the per-task flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl Default for ToolCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: vec![DEFAULT_SCRIPT.to_string()],
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    stations: PathBuf,
    window: TimeWindow,
    output_directory: PathBuf,
    tool: ToolCommand,
    variables: Vec<Variable>,
    on_failure: FailurePolicy,
}

// Deserializes through a helper so that timestamps are parsed and ordered, and the variable list
// and tool command are checked before a Config exists.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            stations: PathBuf,
            start_time: String,
            end_time: String,
            #[serde(default)]
            output_directory: PathBuf,
            tool: Option<ToolHelper>,
            variables: Option<Vec<Variable>>,
            #[serde(default)]
            on_failure: FailurePolicy,
        }

        #[derive(Deserialize)]
        struct ToolHelper {
            program: String,
            #[serde(default)]
            args: Vec<String>,
            timeout_secs: Option<u64>,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;

        let window = TimeWindow::parse(&helper.start_time, &helper.end_time)
            .map_err(|e| D::Error::custom(ConfigError::from(e)))?;

        let variables = helper
            .variables
            .unwrap_or_else(|| Variable::SUNPOINT.to_vec());
        validate_variables(&variables).map_err(D::Error::custom)?;

        let tool = match helper.tool {
            Some(tool) => {
                if tool.program.trim().is_empty() {
                    return Err(D::Error::custom(ConfigError::EmptyProgram));
                }
                let timeout = match tool.timeout_secs {
                    Some(0) => return Err(D::Error::custom(ConfigError::Timeout)),
                    Some(secs) => Some(Duration::from_secs(secs)),
                    None => None,
                };
                ToolCommand {
                    program: tool.program,
                    args: tool.args,
                    timeout,
                }
            }
            None => ToolCommand::default(),
        };

        Ok(Config {
            stations: helper.stations,
            window,
            output_directory: helper.output_directory,
            tool,
            variables,
            on_failure: helper.on_failure,
        })
    }
}

fn validate_variables(variables: &[Variable]) -> Result<(), ConfigError> {
    if variables.is_empty() {
        return Err(ConfigError::NoVariables);
    }

    let mut seen = HashSet::new();
    for variable in variables {
        if !seen.insert(variable) {
            return Err(ConfigError::DuplicateVariable(*variable));
        }
    }

    Ok(())
}

impl Config {
    pub fn new(
        stations: impl Into<PathBuf>,
        window: TimeWindow,
        variables: Vec<Variable>,
    ) -> Result<Self, ConfigError> {
        validate_variables(&variables)?;
        Ok(Self {
            stations: stations.into(),
            window,
            output_directory: PathBuf::new(),
            tool: ToolCommand::default(),
            variables,
            on_failure: FailurePolicy::default(),
        })
    }

    /// The SUNPOINT batch: 16 atmospheric fields for 2016-2020 at every station in
    /// `stations.csv`.
    pub fn sunpoint() -> Result<Self, ConfigError> {
        let window = TimeWindow::parse(SUNPOINT_START, SUNPOINT_END)?;
        Self::new(DEFAULT_STATIONS, window, Variable::SUNPOINT.to_vec())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader).map_err(ConfigError::from)?;

        Ok(config)
    }

    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = dir.into();
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    pub fn stations(&self) -> &Path {
        &self.stations
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn tool(&self) -> &ToolCommand {
        &self.tool
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn on_failure(&self) -> FailurePolicy {
        self.on_failure
    }

    /// One task per variable, in configured order.
    pub fn tasks(&self) -> Vec<ExtractionTask> {
        self.variables
            .iter()
            .map(|variable| ExtractionTask::new(*variable, &self.output_directory))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, file_path)
    }

    #[test]
    fn test_sunpoint() {
        let config = Config::sunpoint().unwrap();

        assert_eq!(config.stations(), Path::new("stations.csv"));
        assert_eq!(config.window().start_str(), "2016-01-01T00:00");
        assert_eq!(config.window().end_str(), "2020-12-31T23:00");
        assert!(config.window().start() < config.window().end());
        assert_eq!(config.variables(), &Variable::SUNPOINT);
        assert_eq!(config.tool(), &ToolCommand::default());
        assert_eq!(config.on_failure(), FailurePolicy::Continue);
    }

    #[test]
    fn test_from_file_minimal() {
        let (_dir, path) = write_config(
            r#"
    {
        "stations": "/data/stations.csv",
        "start_time": "2019-01-01T00:00",
        "end_time": "2019-01-31T23:00"
    }
    "#,
        );

        let config = Config::from_file(path).unwrap();

        assert_eq!(config.stations(), Path::new("/data/stations.csv"));
        assert_eq!(config.window().hours(), 31 * 24);
        assert_eq!(config.variables().len(), 16);
        assert_eq!(config.output_directory(), Path::new(""));
        assert_eq!(config.tool().program, "python3");
        assert_eq!(config.tool().args, vec!["NORA3_ERA5.py".to_string()]);
    }

    #[test]
    fn test_from_file_full() {
        let (_dir, path) = write_config(
            r#"
    {
        "stations": "stations.csv",
        "start_time": "2020-01-01T00:00",
        "end_time": "2020-12-31T23:00",
        "output_directory": "out",
        "tool": { "program": "/opt/nora3/extract", "timeout_secs": 600 },
        "variables": ["air_temperature_2m", "LAI"],
        "on_failure": "abort"
    }
    "#,
        );

        let config = Config::from_file(path).unwrap();

        assert_eq!(
            config.variables(),
            &[Variable::AirTemperature2m, Variable::Lai]
        );
        assert_eq!(config.tool().program, "/opt/nora3/extract");
        assert!(config.tool().args.is_empty());
        assert_eq!(config.tool().timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.on_failure(), FailurePolicy::Abort);

        let tasks = config.tasks();
        assert_eq!(tasks[1].output(), Path::new("out/LAI.nc"));
    }

    #[test]
    fn test_from_file_rejects_reversed_window() {
        let (_dir, path) = write_config(
            r#"{ "stations": "s.csv", "start_time": "2021-01-01T00:00", "end_time": "2020-01-01T00:00" }"#,
        );

        let err = Config::from_file(path).unwrap_err();
        assert!(err.to_string().contains("earlier than start_time"));
    }

    #[test]
    fn test_from_file_rejects_unknown_variable() {
        let (_dir, path) = write_config(
            r#"{ "stations": "s.csv", "start_time": "2020-01-01T00:00", "end_time": "2020-01-02T00:00", "variables": ["msl"] }"#,
        );

        let err = Config::from_file(path).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().contains("unknown NORA3 parameter: msl"));
    }

    #[test]
    fn test_from_file_rejects_duplicates_and_empty_lists() {
        let (_dir, path) = write_config(
            r#"{ "stations": "s.csv", "start_time": "2020-01-01T00:00", "end_time": "2020-01-02T00:00", "variables": ["x_wind_10m", "x_wind_10m"] }"#,
        );
        let err = Config::from_file(path).unwrap_err();
        assert!(err.to_string().contains("x_wind_10m is listed more than once"));

        let (_dir, path) = write_config(
            r#"{ "stations": "s.csv", "start_time": "2020-01-01T00:00", "end_time": "2020-01-02T00:00", "variables": [] }"#,
        );
        let err = Config::from_file(path).unwrap_err();
        assert!(err.to_string().contains("variables cannot be empty"));
    }

    #[test]
    fn test_from_file_rejects_zero_timeout() {
        let (_dir, path) = write_config(
            r#"{ "stations": "s.csv", "start_time": "2020-01-01T00:00", "end_time": "2020-01-02T00:00", "tool": { "program": "extract", "timeout_secs": 0 } }"#,
        );
        let err = Config::from_file(path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempdir().unwrap();
        let err = Config::from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_tasks_follow_variable_order() {
        let config = Config::sunpoint().unwrap();
        let tasks = config.tasks();

        assert_eq!(tasks.len(), 16);
        for (task, variable) in tasks.iter().zip(Variable::SUNPOINT) {
            assert_eq!(task.variable(), variable);
            assert_eq!(task.output(), Path::new(&variable.file_name()));
        }
    }
}
