//! CLI command handlers
//!
//! Argument parsing structures, command routing and the command
//! implementations.

pub mod args;
pub mod commands;
pub mod router;

pub use args::{Cli, Commands, OutputFormat};
pub use router::execute_command;
