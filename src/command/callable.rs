//! In-process command wrapping a closure
//!
//! The closure receives the command itself so it can write `output` and
//! `error` while it works. Returning `Ok` means success; returning `Err`
//! or panicking marks the command as failed, with the message appended to
//! `error`. `backtrace` holds the cause chain followed by the captured
//! stack when backtraces are enabled, or the panic site for a panic.
//!
//! The closure runs with the process working directory switched to the
//! command's `working_directory`. The switch is undone before `run`
//! returns, on every path. `exec_time` includes entering and leaving that
//! directory.

use super::{Command, CommandState, CommandStatus, ExecutionContext, WorkingDirGuard};
use crate::error::{CommandError, Result};
use async_trait::async_trait;
use std::any::Any;
use std::backtrace::BacktraceStatus;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::time::Instant;

thread_local! {
    static CATCHING: Cell<bool> = const { Cell::new(false) };
    static PANIC_SITE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Panics raised while a callable runs are recorded on the panicking
/// thread instead of being printed. Other panics go to the previous hook.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if CATCHING.with(Cell::get) {
                let site = info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
                PANIC_SITE.with(|slot| *slot.borrow_mut() = site);
            } else {
                previous(info);
            }
        }));
    });
}

fn catch_panics<T>(work: impl FnOnce() -> T) -> std::result::Result<T, Failure> {
    install_panic_hook();
    let outer = CATCHING.with(|c| c.replace(true));
    let result = std::panic::catch_unwind(AssertUnwindSafe(work));
    CATCHING.with(|c| c.set(outer));

    result.map_err(|payload| {
        let site = PANIC_SITE.with(|slot| slot.borrow_mut().take());
        Failure::from_panic(payload, site)
    })
}

pub type Work = Arc<dyn Fn(&mut CallableCommand) -> anyhow::Result<()> + Send + Sync>;

pub struct CallableCommand {
    state: CommandState,
    working_directory: PathBuf,
    work: Work,
    context: Option<ExecutionContext>,
}

#[derive(Default)]
pub struct CallableCommandBuilder {
    name: String,
    working_directory: Option<PathBuf>,
    work: Option<Work>,
}

impl CallableCommandBuilder {
    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn work<F>(mut self, work: F) -> Self
    where
        F: Fn(&mut CallableCommand) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.work = Some(Arc::new(work));
        self
    }

    pub fn build(self) -> Result<CallableCommand> {
        let work = self.work.ok_or(CommandError::MissingCallable)?;
        Ok(CallableCommand {
            state: CommandState::named(self.name),
            working_directory: self
                .working_directory
                .unwrap_or_else(|| PathBuf::from(".")),
            work,
            context: None,
        })
    }
}

/// What went wrong inside the closure
struct Failure {
    message: String,
    backtrace: String,
}

impl Failure {
    fn from_error(error: anyhow::Error) -> Self {
        let mut backtrace = error
            .chain()
            .enumerate()
            .map(|(i, cause)| format!("{i}: {cause}"))
            .collect::<Vec<_>>()
            .join("\n");
        if error.backtrace().status() == BacktraceStatus::Captured {
            backtrace.push('\n');
            backtrace.push_str(&error.backtrace().to_string());
        }
        Self {
            message: error.to_string(),
            backtrace,
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>, site: Option<String>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with non-string payload".to_string());
        let backtrace = match site {
            Some(site) => format!("panicked at {site}: {message}"),
            None => format!("panicked: {message}"),
        };
        Self { message, backtrace }
    }
}

impl CallableCommand {
    pub fn builder(name: impl Into<String>) -> CallableCommandBuilder {
        CallableCommandBuilder {
            name: name.into(),
            ..CallableCommandBuilder::default()
        }
    }

    /// Shorthand for a command running in the current directory
    pub fn new<F>(name: impl Into<String>, work: F) -> Self
    where
        F: Fn(&mut CallableCommand) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            state: CommandState::named(name),
            working_directory: PathBuf::from("."),
            work: Arc::new(work),
            context: None,
        }
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// The context passed to the ongoing `run`; `None` outside of it
    pub fn context(&self) -> Option<&ExecutionContext> {
        self.context.as_ref()
    }

    pub fn set_output(&mut self, output: impl Into<String>) {
        self.state.output = output.into();
    }

    pub fn append_output(&mut self, output: &str) {
        self.state.output.push_str(output);
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.state.error = error.into();
    }

    pub fn append_error(&mut self, error: &str) {
        self.state.append_error(error);
    }

    fn invoke(&mut self) -> std::result::Result<(), Failure> {
        let _guard = WorkingDirGuard::enter(&self.working_directory).map_err(|e| Failure {
            message: format!(
                "Failed to enter working directory {}: {}",
                self.working_directory.display(),
                e
            ),
            backtrace: format!("{:?}", e),
        })?;

        let work = Arc::clone(&self.work);
        catch_panics(|| (*work)(self))?.map_err(Failure::from_error)
    }
}

#[async_trait]
impl Command for CallableCommand {
    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    async fn run(&mut self, context: Option<&ExecutionContext>) -> CommandStatus {
        self.state.backtrace.clear();
        self.state.error.clear();
        self.state.output.clear();
        self.context = context.cloned();

        let start = Instant::now();
        let outcome = self.invoke();
        self.state.exec_time = start.elapsed();

        self.state.status = match outcome {
            Ok(()) => CommandStatus::Success,
            Err(failure) => {
                tracing::debug!("'{}' raised: {}", self.state.name, failure.message);
                self.state.append_error(&failure.message);
                self.state.backtrace = failure.backtrace;
                CommandStatus::Error
            }
        };

        self.context = None;
        self.state.status
    }
}

impl fmt::Debug for CallableCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableCommand")
            .field("state", &self.state)
            .field("working_directory", &self.working_directory)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
