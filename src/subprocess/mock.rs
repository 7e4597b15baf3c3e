use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner};

/// Scripted runner: hands out queued responses in order and records every call
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    responses: Arc<Mutex<VecDeque<Result<ProcessOutput, ProcessError>>>>,
    call_history: Arc<Mutex<Vec<ProcessCommand>>>,
}

pub struct MockResponseConfig {
    runner: MockProcessRunner,
    response: ProcessOutput,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_run(&self) -> MockResponseConfig {
        MockResponseConfig {
            runner: self.clone(),
            response: ProcessOutput {
                status: ExitStatus::Exited(0),
                stdout: String::new(),
                stderr: String::new(),
                duration: Duration::from_millis(10),
                pid: None,
                kill_error: None,
            },
        }
    }

    pub fn expect_error(&self, error: ProcessError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn get_call_history(&self) -> Vec<ProcessCommand> {
        self.call_history.lock().unwrap().clone()
    }

    pub fn verify_called(&self, times: usize) -> bool {
        self.call_history.lock().unwrap().len() == times
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.call_history.lock().unwrap().push(command.clone());

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProcessError::MockExpectationNotMet(format!(
                    "No response queued for command: {}",
                    command.display()
                )))
            })
    }
}

impl MockResponseConfig {
    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        self.response.stdout = stdout.to_string();
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        self.response.stderr = stderr.to_string();
        self
    }

    pub fn returns_status(mut self, status: ExitStatus) -> Self {
        self.response.status = status;
        self
    }

    pub fn returns_exit_code(self, code: i32) -> Self {
        self.returns_status(ExitStatus::Exited(code))
    }

    pub fn returns_kill_error(mut self, message: &str) -> Self {
        self.response.kill_error = Some(message.to_string());
        self
    }

    pub fn finish(self) {
        self.runner
            .responses
            .lock()
            .unwrap()
            .push_back(Ok(self.response));
    }
}
