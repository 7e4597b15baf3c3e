//! Command implementation modules

pub mod run;
pub mod validate;

pub use run::{execute_sequence, run_sequence_command};
pub use validate::run_validate_command;
