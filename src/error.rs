use thiserror::Error;

/// Errors raised while constructing a command.
///
/// Failures during `run` never surface as `Err`; they end up in the
/// command's `error` text and status instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("No command given")]
    MissingCommand,

    #[error("You need to provide work to run")]
    MissingCallable,

    #[error("Timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),
}

pub type Result<T> = std::result::Result<T, CommandError>;
