//! Sequence status aggregation
//!
//! [`CommandSequenceStatus`] collects a snapshot per step number and keeps
//! a single aggregate status, updated incrementally as steps are recorded.
//! It does not run anything itself: whoever drives the sequence records
//! steps and reads back `status`, [`is_completed`](CommandSequenceStatus::is_completed)
//! and [`summary`](CommandSequenceStatus::summary). Concurrent writers must
//! serialize their calls to `record_step`.

pub mod step;
pub mod transition;

pub use step::StepState;
pub use transition::next_status;

use crate::command::{Command, CommandStatus, Strategy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct CommandSequenceStatus {
    pub sequence_name: String,
    pub sequence_id: Option<String>,
    pub sequence_runner: String,
    pub start_time: DateTime<Utc>,
    pub stop_time: Option<DateTime<Utc>>,
    /// Strategy reported when this status is nested as a step
    pub strategy: Strategy,
    status: CommandStatus,
    step_states: BTreeMap<u32, StepState>,
}

impl CommandSequenceStatus {
    pub fn new(sequence_name: impl Into<String>) -> Self {
        Self {
            sequence_name: sequence_name.into(),
            sequence_id: None,
            sequence_runner: String::new(),
            start_time: Utc::now(),
            stop_time: None,
            strategy: Strategy::default(),
            status: CommandStatus::NotExecuted,
            step_states: BTreeMap::new(),
        }
    }

    /// Start from a set of known steps, e.g. every planned step as pending
    pub fn with_steps(
        sequence_name: impl Into<String>,
        steps: impl IntoIterator<Item = StepState>,
    ) -> Self {
        let mut status = Self::new(sequence_name);
        for step in steps {
            status.record_step(step);
        }
        status.start_time = Utc::now();
        status
    }

    pub fn with_id(mut self, sequence_id: impl Into<String>) -> Self {
        self.sequence_id = Some(sequence_id.into());
        self
    }

    pub fn with_runner(mut self, sequence_runner: impl Into<String>) -> Self {
        self.sequence_runner = sequence_runner.into();
        self
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    /// Override the aggregate, e.g. to leave `running` once the run is over
    pub fn set_status(&mut self, status: CommandStatus) {
        self.status = status;
    }

    /// Store `step` under its number, replacing any earlier snapshot, and
    /// fold its status into the aggregate.
    pub fn record_step(&mut self, step: StepState) {
        let incoming = step.status;
        let number = step.number;
        self.step_states.insert(number, step);

        let previous = self.status;
        self.status = next_status(previous, incoming);
        if previous != self.status {
            tracing::trace!(
                "Sequence '{}' went from {} to {} after step {} ({})",
                self.sequence_name,
                previous,
                self.status,
                number,
                incoming
            );
        }
    }

    /// Record the current results of `command`
    pub fn record<C: Command + ?Sized>(&mut self, command: &C) {
        self.record_step(command.snapshot());
    }

    pub fn step_state(&self, number: u32) -> Option<&StepState> {
        self.step_states.get(&number)
    }

    /// Recorded steps in ascending number order
    pub fn step_states(&self) -> impl Iterator<Item = &StepState> {
        self.step_states.values()
    }

    pub fn step_count(&self) -> usize {
        self.step_states.len()
    }

    pub fn is_running(&self) -> bool {
        self.status == CommandStatus::Running
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }

    pub fn is_executed(&self) -> bool {
        self.status != CommandStatus::NotExecuted
    }

    /// A sequence is completed when a step failed under `fail_on_error`,
    /// warned under `fail_on_warning`, or when no step is left pending or
    /// running.
    pub fn is_completed(&self) -> bool {
        if !self.is_executed() {
            return false;
        }

        let fails_fast = self.step_states.values().any(|step| {
            matches!(
                (step.status, step.strategy),
                (CommandStatus::Error, Strategy::FailOnError)
                    | (CommandStatus::Warning, Strategy::FailOnWarning)
            )
        });
        if fails_fast {
            return true;
        }

        self.step_states.values().all(|step| step.status.is_terminal())
    }

    /// Short text digest: id, name, overall status and one line per step
    pub fn summary(&self) -> String {
        let mut sum = String::new();
        if let Some(id) = &self.sequence_id {
            let _ = write!(sum, "{id}:");
        }
        if !self.sequence_name.is_empty() {
            let _ = write!(sum, "{}. ", self.sequence_name);
        }
        let _ = write!(sum, "Status - {}", self.status);

        if !self.step_states.is_empty() && self.is_executed() {
            let _ = write!(
                sum,
                ". States {}\nStep status summary:",
                self.step_states.len()
            );
            for (number, state) in &self.step_states {
                let _ = write!(sum, "\n\t{}:'{}' - {}", number, state.name, state.status);
            }
        }
        sum
    }

    /// `stop_time - start_time`, zero while the sequence has not stopped
    pub fn exec_time(&self) -> Duration {
        match self.stop_time {
            Some(stop) => (stop - self.start_time).to_std().unwrap_or_default(),
            None => Duration::ZERO,
        }
    }

    /// Mark the sequence as stopped now
    pub fn stop(&mut self) {
        self.stop_time = Some(Utc::now());
    }

    pub fn name(&self) -> &str {
        &self.sequence_name
    }

    pub fn number(&self) -> Option<&str> {
        self.sequence_id.as_deref()
    }

    pub fn output(&self) -> String {
        self.summary()
    }

    pub fn error(&self) -> &str {
        ""
    }

    /// This sequence as a step of an enclosing sequence
    pub fn snapshot(&self, number: u32) -> StepState {
        StepState {
            number,
            name: self.sequence_name.clone(),
            status: self.status,
            output: self.summary(),
            duration: self.exec_time(),
            error: String::new(),
            strategy: self.strategy,
        }
    }
}

impl fmt::Display for CommandSequenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}':'{}' on '{}' started at {}.{} steps",
            self.sequence_id.as_deref().unwrap_or_default(),
            self.sequence_name,
            self.sequence_runner,
            self.start_time.format("%Y-%m-%d %H:%M:%S"),
            self.step_states.len()
        )
    }
}
