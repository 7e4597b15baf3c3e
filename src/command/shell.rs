//! Shell-backed command

use super::{Command, CommandState, CommandStatus, ExecutionContext};
use crate::error::{CommandError, Result};
use crate::subprocess::{
    ExitStatus, ProcessCommandBuilder, ProcessError, ProcessOutput, SubprocessManager,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Construction parameters for a [`ShellCommand`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShellCommandConfig {
    /// Shell invocation to run (required)
    #[serde(default, alias = "cmd")]
    pub command: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Wall-clock limit in seconds
    #[serde(default)]
    pub timeout: Option<f64>,
    /// Created on every run if missing; defaults to `.`
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
}

impl ShellCommandConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }
}

/// Runs a command line through the platform shell.
///
/// Configuration is fixed at construction; every `run` starts from a
/// clean `output`/`error`.
#[derive(Debug)]
pub struct ShellCommand {
    state: CommandState,
    command: String,
    working_directory: PathBuf,
    timeout: Option<Duration>,
    subprocess: SubprocessManager,
}

impl ShellCommand {
    pub fn new(config: ShellCommandConfig) -> Result<Self> {
        let command = config.command.ok_or(CommandError::MissingCommand)?;
        let timeout = config.timeout.map(parse_timeout).transpose()?;

        Ok(Self {
            state: CommandState::named(config.name.unwrap_or_default()),
            command,
            working_directory: config
                .working_directory
                .unwrap_or_else(|| PathBuf::from(".")),
            timeout,
            subprocess: SubprocessManager::production(),
        })
    }

    /// Swap the process runner, e.g. for a mock in tests
    pub fn with_subprocess(mut self, subprocess: SubprocessManager) -> Self {
        self.subprocess = subprocess;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn execute(&self) -> std::result::Result<ProcessOutput, ProcessError> {
        tokio::fs::create_dir_all(&self.working_directory)
            .await
            .map_err(|source| ProcessError::WorkingDirectory {
                path: self.working_directory.clone(),
                source,
            })?;

        let mut builder =
            ProcessCommandBuilder::shell(&self.command).current_dir(&self.working_directory);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        self.subprocess.runner().run(builder.build()).await
    }

    fn apply_output(&mut self, output: ProcessOutput) {
        self.state.output = output.stdout;

        if output.status == ExitStatus::TimedOut {
            let limit = self.timeout.unwrap_or(output.duration);
            self.state.error = format!("Command timed out after {:?}", limit);
            if let Some(kill_error) = output.kill_error {
                self.state.append_error(&kill_error);
            }
            if !output.stderr.is_empty() {
                self.state.append_error(&output.stderr);
            }
        } else {
            self.state.error = output.stderr;
        }

        self.state.status = status_for(output.status);
    }

    fn record_failure(&mut self, error: ProcessError, debug: bool) {
        tracing::debug!("Command '{}' failed to execute: {}", self.command, error);

        self.state.append_error(&error.to_string());
        if debug {
            let detail = format!("{:?}", error);
            self.state.append_error(&detail);
            self.state.backtrace = detail;
        }
        self.state.status = CommandStatus::Error;
    }
}

/// Map how a process ended to a command status
pub fn status_for(exit: ExitStatus) -> CommandStatus {
    match exit {
        ExitStatus::Exited(0) => CommandStatus::Success,
        ExitStatus::Exited(_) => CommandStatus::Error,
        ExitStatus::TimedOut => CommandStatus::Error,
        ExitStatus::Signaled(_) | ExitStatus::Unknown => CommandStatus::Warning,
    }
}

fn parse_timeout(seconds: f64) -> Result<Duration> {
    if seconds.is_nan() || seconds <= 0.0 {
        return Err(CommandError::InvalidTimeout(seconds));
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| CommandError::InvalidTimeout(seconds))
}

#[async_trait]
impl Command for ShellCommand {
    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    async fn run(&mut self, context: Option<&ExecutionContext>) -> CommandStatus {
        let start = Instant::now();
        let debug = context.is_some_and(|c| c.debug);

        self.state.output.clear();
        self.state.error.clear();
        self.state.backtrace.clear();
        self.state.status = CommandStatus::Running;

        match self.execute().await {
            Ok(output) => self.apply_output(output),
            Err(e) => self.record_failure(e, debug),
        }

        self.state.exec_time = start.elapsed();
        tracing::debug!(
            "{} finished with status {} in {:?}",
            self,
            self.state.status,
            self.state.exec_time
        );
        self.state.status
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} in {}",
            self.state.name,
            self.command,
            self.working_directory.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mocked(config: ShellCommandConfig) -> (ShellCommand, crate::subprocess::MockProcessRunner) {
        let (manager, mock) = SubprocessManager::mock();
        let dir = std::env::temp_dir();
        let config = ShellCommandConfig {
            working_directory: config.working_directory.or(Some(dir)),
            ..config
        };
        (ShellCommand::new(config).unwrap().with_subprocess(manager), mock)
    }

    #[test]
    fn test_missing_command_is_rejected() {
        let result = ShellCommand::new(ShellCommandConfig::default());
        assert_eq!(result.unwrap_err(), CommandError::MissingCommand);
    }

    #[test]
    fn test_invalid_timeouts_are_rejected() {
        for timeout in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = ShellCommand::new(ShellCommandConfig::new("true").with_timeout(timeout));
            assert!(
                matches!(result, Err(CommandError::InvalidTimeout(_))),
                "timeout {timeout} should be rejected"
            );
        }
    }

    #[test]
    fn test_defaults() {
        let command = ShellCommand::new(ShellCommandConfig::new("ls")).unwrap();
        assert_eq!(command.name(), "");
        assert_eq!(command.working_directory(), Path::new("."));
        assert_eq!(command.timeout(), None);
        assert_eq!(command.status(), CommandStatus::NotExecuted);
        assert_eq!(command.to_string(), ": ls in .");
    }

    #[test]
    fn test_config_from_yaml_accepts_cmd_alias() {
        let config: ShellCommandConfig =
            serde_yaml::from_str("cmd: make test\nname: tests\ntimeout: 1.5").unwrap();
        let command = ShellCommand::new(config).unwrap();
        assert_eq!(command.command(), "make test");
        assert_eq!(command.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(command.to_string(), "tests: make test in .");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ExitStatus::Exited(0)), CommandStatus::Success);
        assert_eq!(status_for(ExitStatus::Exited(2)), CommandStatus::Error);
        assert_eq!(status_for(ExitStatus::TimedOut), CommandStatus::Error);
        assert_eq!(status_for(ExitStatus::Signaled(9)), CommandStatus::Warning);
        assert_eq!(status_for(ExitStatus::Unknown), CommandStatus::Warning);
    }

    #[tokio::test]
    async fn test_signaled_process_is_a_warning() {
        let (mut command, mock) = mocked(ShellCommandConfig::new("kill -9 $$"));
        mock.expect_run()
            .returns_status(ExitStatus::Signaled(9))
            .finish();

        assert_eq!(command.run(None).await, CommandStatus::Warning);
        assert!(command.is_executed());
    }

    #[tokio::test]
    async fn test_timeout_with_kill_failure() {
        let (mut command, mock) = mocked(ShellCommandConfig::new("sleep 60").with_timeout(1.0));
        mock.expect_run()
            .returns_status(ExitStatus::TimedOut)
            .returns_stderr("half a line")
            .returns_kill_error("Failure to kill timeout child process 42: EPERM")
            .finish();

        assert_eq!(command.run(None).await, CommandStatus::Error);
        assert_eq!(
            command.error(),
            "Command timed out after 1s\nFailure to kill timeout child process 42: EPERM\nhalf a line"
        );
    }

    #[tokio::test]
    async fn test_spawn_failure_is_captured() {
        let (mut command, mock) = mocked(ShellCommandConfig::new("whatever"));
        mock.expect_error(ProcessError::CommandNotFound("sh".to_string()));

        assert_eq!(command.run(None).await, CommandStatus::Error);
        assert_eq!(command.error(), "Command not found: sh");
        assert_eq!(command.backtrace(), "");
    }

    #[tokio::test]
    async fn test_spawn_failure_detail_in_debug_mode() {
        let (mut command, mock) = mocked(ShellCommandConfig::new("whatever"));
        mock.expect_error(ProcessError::CommandNotFound("sh".to_string()));

        let context = ExecutionContext::new().with_debug(true);
        assert_eq!(command.run(Some(&context)).await, CommandStatus::Error);
        assert!(command.error().starts_with("Command not found: sh\n"));
        assert!(command.backtrace().contains("CommandNotFound"));
    }

    #[tokio::test]
    async fn test_each_run_starts_clean() {
        let (mut command, mock) = mocked(ShellCommandConfig::new("flaky"));
        mock.expect_run()
            .returns_exit_code(1)
            .returns_stderr("first failure")
            .finish();
        mock.expect_run().returns_stdout("fine").finish();

        assert_eq!(command.run(None).await, CommandStatus::Error);
        assert_eq!(command.error(), "first failure");

        assert_eq!(command.run(None).await, CommandStatus::Success);
        assert_eq!(command.error(), "");
        assert_eq!(command.output(), "fine");
        assert!(mock.verify_called(2));
    }

    #[tokio::test]
    async fn test_runner_receives_shell_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let (mut command, mock) = mocked(
            ShellCommandConfig::new("echo hi")
                .with_timeout(2.0)
                .with_working_directory(dir.path()),
        );
        mock.expect_run().finish();

        command.run(None).await;

        let call = &mock.get_call_history()[0];
        assert_eq!(call.args.last().map(String::as_str), Some("echo hi"));
        assert_eq!(call.working_dir.as_deref(), Some(dir.path()));
        assert_eq!(call.timeout, Some(Duration::from_secs(2)));
    }
}
