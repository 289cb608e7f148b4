use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::Duration;

use thiserror::Error;
use wait_timeout::ChildExt;

use crate::config::ToolCommand;
use crate::variables::Variable;

/// The five parameters handed to the extractor for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stations: PathBuf,
    pub variable: Variable,
    pub output: PathBuf,
    pub start: String,
    pub end: String,
}

impl Invocation {
    /// Flags in the order the extractor documents them: `-i -p -o -s -e`.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "-i".into(),
            self.stations.clone().into_os_string(),
            "-p".into(),
            self.variable.as_str().into(),
            "-o".into(),
            self.output.clone().into_os_string(),
            "-s".into(),
            self.start.clone().into(),
            "-e".into(),
            self.end.clone().into(),
        ]
    }

    pub fn command_line(&self, tool: &ToolCommand) -> String {
        std::iter::once(tool.program.clone())
            .chain(tool.args.iter().cloned())
            .chain(
                self.args()
                    .into_iter()
                    .map(|arg| arg.to_string_lossy().into_owned()),
            )
            .map(|arg| quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// Single-quotes arguments a shell would otherwise split.
fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '\'') {
        format!("'{}'", arg.replace('\'', "'\\''"))
    } else {
        arg.to_string()
    }
}

/// Exit status of one extractor run. `code` is `None` when the process was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatus {
    code: Option<i32>,
}

impl ToolStatus {
    pub const SUCCESS: ToolStatus = ToolStatus { code: Some(0) };

    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn signalled() -> Self {
        Self { code: None }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<ExitStatus> for ToolStatus {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => write!(f, "killed by signal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for extractor: {0}")]
    Wait(#[source] std::io::Error),
    #[error("extractor timed out after {0:?}")]
    Timeout(Duration),
}

/// Runs one extraction. Implementations block until the extraction is over.
pub trait Extractor {
    fn extract(&mut self, invocation: &Invocation) -> Result<ToolStatus, ToolError>;
}

/// The real extractor, run as a child process with inherited stdio.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    command: ToolCommand,
}

impl ExternalTool {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

impl Extractor for ExternalTool {
    fn extract(&mut self, invocation: &Invocation) -> Result<ToolStatus, ToolError> {
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .args(invocation.args())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        let status = match self.command.timeout {
            Some(timeout) => match child.wait_timeout(timeout).map_err(ToolError::Wait)? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ToolError::Timeout(timeout));
                }
            },
            None => child.wait().map_err(ToolError::Wait)?,
        };

        Ok(status.into())
    }
}

/// Prints each command line instead of running it.
#[derive(Debug, Clone)]
pub struct DryRun {
    command: ToolCommand,
}

impl DryRun {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

impl Extractor for DryRun {
    fn extract(&mut self, invocation: &Invocation) -> Result<ToolStatus, ToolError> {
        println!("{}", invocation.command_line(&self.command));
        Ok(ToolStatus::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> Invocation {
        Invocation {
            stations: PathBuf::from("stations.csv"),
            variable: Variable::AirTemperature2m,
            output: PathBuf::from("air_temperature_2m.nc"),
            start: "2016-01-01T00:00".to_string(),
            end: "2020-12-31T23:00".to_string(),
        }
    }

    #[test]
    fn test_args_order() {
        let args: Vec<String> = invocation()
            .args()
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();

        assert_eq!(
            args,
            vec![
                "-i",
                "stations.csv",
                "-p",
                "air_temperature_2m",
                "-o",
                "air_temperature_2m.nc",
                "-s",
                "2016-01-01T00:00",
                "-e",
                "2020-12-31T23:00",
            ]
        );
    }

    #[test]
    fn test_command_line() {
        let line = invocation().command_line(&ToolCommand::default());
        assert_eq!(
            line,
            "python3 NORA3_ERA5.py -i stations.csv -p air_temperature_2m -o air_temperature_2m.nc -s 2016-01-01T00:00 -e 2020-12-31T23:00"
        );
    }

    #[test]
    fn test_command_line_quotes_paths_with_spaces() {
        let mut spaced = invocation();
        spaced.stations = PathBuf::from("SUNPOINT stations.csv");
        spaced.output = PathBuf::from("my runs/air_temperature_2m.nc");

        let line = spaced.command_line(&ToolCommand::default());
        assert_eq!(
            line,
            "python3 NORA3_ERA5.py -i 'SUNPOINT stations.csv' -p air_temperature_2m -o 'my runs/air_temperature_2m.nc' -s 2016-01-01T00:00 -e 2020-12-31T23:00"
        );
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain.nc"), "plain.nc");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("it's here"), "'it'\\''s here'");
    }

    #[test]
    fn test_tool_status() {
        assert!(ToolStatus::SUCCESS.success());
        assert!(!ToolStatus::from_code(3).success());
        assert_eq!(ToolStatus::from_code(3).to_string(), "exit status 3");
        assert_eq!(ToolStatus::signalled().code(), None);
        assert_eq!(ToolStatus::signalled().to_string(), "killed by signal");
    }

    #[test]
    fn test_missing_program_is_a_spawn_error() {
        let mut tool = ExternalTool::new(ToolCommand {
            program: "nora3-batch-no-such-program".to_string(),
            args: vec![],
            timeout: None,
        });

        let err = tool.extract(&invocation()).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { ref program, .. } if program == "nora3-batch-no-such-program"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_is_reported() {
        let mut tool = ExternalTool::new(ToolCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 7".to_string(), "stub".to_string()],
            timeout: None,
        });

        let status = tool.extract(&invocation()).unwrap();
        assert_eq!(status, ToolStatus::from_code(7));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_the_child() {
        let mut tool = ExternalTool::new(ToolCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 5".to_string(), "stub".to_string()],
            timeout: Some(Duration::from_millis(100)),
        });

        let err = tool.extract(&invocation()).unwrap_err();
        assert!(matches!(err, ToolError::Timeout(d) if d == Duration::from_millis(100)));
    }

    #[test]
    fn test_dry_run_always_succeeds() {
        let mut dry_run = DryRun::new(ToolCommand::default());
        assert_eq!(dry_run.extract(&invocation()).unwrap(), ToolStatus::SUCCESS);
    }
}
