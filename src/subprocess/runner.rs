use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;

use super::error::ProcessError;

/// How long stream readers may keep going once a timed out process was killed
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How long to wait for a killed process to be reaped
const REAP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl ProcessCommand {
    pub fn display(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub pid: Option<u32>,
    /// Set when a timed out process could not be terminated cleanly
    pub kill_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The process exited on its own with this code
    Exited(i32),
    /// The process was terminated by a signal
    Signaled(i32),
    /// The platform reported neither an exit code nor a signal
    Unknown,
    /// The process outlived its timeout and was killed
    TimedOut,
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Exited(0))
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Exited(code) => Some(*code),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn log_command_start(command: &ProcessCommand) {
        tracing::debug!("Executing subprocess: {}", command.display());

        if let Some(ref dir) = command.working_dir {
            tracing::trace!("Working directory: {:?}", dir);
        }
        if let Some(timeout) = command.timeout {
            tracing::trace!("Timeout: {:?}", timeout);
        }
    }

    fn configure_command(command: &ProcessCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&command.program);

        // Own process group so a timeout can take down every descendant at once
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        cmd.args(&command.args);

        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn map_spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        tracing::debug!(
            "Failed to spawn '{}': {:?} (kind: {:?})",
            command.program,
            error,
            error.kind()
        );
        if error.kind() == std::io::ErrorKind::NotFound {
            if let Some(dir) = &command.working_dir {
                if !dir.is_dir() {
                    return ProcessError::Io(error);
                }
            }
            ProcessError::CommandNotFound(command.program.clone())
        } else {
            ProcessError::SpawnFailed {
                command: command.display(),
                source: error,
            }
        }
    }

    /// Read a child stream to the end on its own task
    fn drain<R>(stream: Option<R>) -> JoinHandle<Vec<u8>>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        tokio::spawn(async move {
            let mut buffer = Vec::new();
            if let Some(mut stream) = stream {
                if let Err(e) = stream.read_to_end(&mut buffer).await {
                    tracing::trace!("Stream closed with error: {}", e);
                }
            }
            buffer
        })
    }

    /// Wait for a drain task, giving up after `grace` when one is given
    async fn collect(mut handle: JoinHandle<Vec<u8>>, grace: Option<Duration>) -> String {
        let bytes = match grace {
            None => (&mut handle).await.unwrap_or_default(),
            Some(grace) => match tokio::time::timeout(grace, &mut handle).await {
                Ok(joined) => joined.unwrap_or_default(),
                Err(_) => {
                    tracing::debug!("Stream still open {:?} after kill, abandoning it", grace);
                    handle.abort();
                    Vec::new()
                }
            },
        };
        String::from_utf8_lossy(&bytes).to_string()
    }

    /// Race the process against its timeout. The timer is dropped when the
    /// process exits first; the process group is killed when the timer fires.
    async fn wait_or_kill(
        child: &mut Child,
        limit: Duration,
    ) -> Result<(ExitStatus, Option<String>), ProcessError> {
        let exited = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::time::sleep(limit) => None,
        };

        match exited {
            Some(status) => Ok((Self::parse_exit_status(status?), None)),
            None => {
                tracing::warn!("Subprocess exceeded timeout of {:?}, killing it", limit);
                let kill_error = Self::kill_process_group(child)
                    .await
                    .err()
                    .map(|e| e.to_string());
                Ok((ExitStatus::TimedOut, kill_error))
            }
        }
    }

    /// Send SIGKILL to the whole process group and reap the child
    async fn kill_process_group(child: &mut Child) -> Result<(), ProcessError> {
        let Some(pid) = child.id() else {
            // Already reaped
            return Ok(());
        };

        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Err(errno) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                tracing::debug!("killpg({}) failed: {}, killing the child only", pid, errno);
                child.start_kill().map_err(|e| ProcessError::KillFailed {
                    pid,
                    message: format!("{errno}; {e}"),
                })?;
            }
        }

        #[cfg(not(unix))]
        child.start_kill().map_err(|e| ProcessError::KillFailed {
            pid,
            message: e.to_string(),
        })?;

        match tokio::time::timeout(REAP_GRACE, child.wait()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ProcessError::KillFailed {
                pid,
                message: e.to_string(),
            }),
            Err(_) => Err(ProcessError::KillFailed {
                pid,
                message: format!("still running {:?} after SIGKILL", REAP_GRACE),
            }),
        }
    }

    fn parse_exit_status(status: std::process::ExitStatus) -> ExitStatus {
        match status.code() {
            Some(code) => ExitStatus::Exited(code),
            None => Self::parse_signal_status(status),
        }
    }

    #[cfg(unix)]
    fn parse_signal_status(status: std::process::ExitStatus) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        status
            .signal()
            .map(ExitStatus::Signaled)
            .unwrap_or(ExitStatus::Unknown)
    }

    #[cfg(not(unix))]
    fn parse_signal_status(_status: std::process::ExitStatus) -> ExitStatus {
        ExitStatus::Unknown
    }

    fn log_result(result: &ProcessOutput, command: &ProcessCommand) {
        let command_str = command.display();

        match &result.status {
            ExitStatus::Exited(0) => {
                tracing::debug!(
                    "Subprocess completed successfully in {:?}: {}",
                    result.duration,
                    command_str
                );
                tracing::trace!("Stdout length: {} bytes", result.stdout.len());
                tracing::trace!("Stderr length: {} bytes", result.stderr.len());
            }
            ExitStatus::Exited(code) => {
                tracing::debug!(
                    "Subprocess failed with exit code {} in {:?}: {}",
                    code,
                    result.duration,
                    command_str
                );
                if !result.stderr.is_empty() {
                    tracing::trace!("Stderr: {}", result.stderr);
                }
            }
            ExitStatus::Signaled(signal) => {
                tracing::warn!(
                    "Subprocess terminated by signal {} in {:?}: {}",
                    signal,
                    result.duration,
                    command_str
                );
            }
            ExitStatus::Unknown => {
                tracing::warn!("Subprocess exit status unknown: {}", command_str);
            }
            ExitStatus::TimedOut => {
                tracing::warn!(
                    "Subprocess timed out after {:?}: {}",
                    result.duration,
                    command_str
                );
                if let Some(ref e) = result.kill_error {
                    tracing::error!("{}", e);
                }
            }
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let start = Instant::now();

        Self::log_command_start(&command);

        let mut child = Self::configure_command(&command)
            .spawn()
            .map_err(|e| Self::map_spawn_error(e, &command))?;
        let pid = child.id();

        let stdout = Self::drain(child.stdout.take());
        let stderr = Self::drain(child.stderr.take());

        let (status, kill_error) = match command.timeout {
            Some(limit) => Self::wait_or_kill(&mut child, limit).await?,
            None => (Self::parse_exit_status(child.wait().await?), None),
        };

        let grace = (status == ExitStatus::TimedOut).then_some(DRAIN_GRACE);
        let result = ProcessOutput {
            status,
            stdout: Self::collect(stdout, grace).await,
            stderr: Self::collect(stderr, grace).await,
            duration: start.elapsed(),
            pid,
            kill_error,
        };

        Self::log_result(&result, &command);

        Ok(result)
    }
}
