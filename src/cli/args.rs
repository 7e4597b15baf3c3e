//! CLI argument structures

use crate::app::LogMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Run command sequences and report their aggregate status
#[derive(Parser)]
#[command(name = "stepwise")]
#[command(about = "stepwise - Run command sequences and report their aggregate status", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Base log level before -v is applied
    #[arg(long, value_enum, default_value_t = LogMode::Normal, global = true)]
    pub log_mode: LogMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a sequence file step by step
    #[command(name = "run")]
    Run {
        /// Sequence definition (YAML)
        sequence: PathBuf,

        /// How to print the final status
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Include diagnostic detail in step errors
        #[arg(long)]
        debug: bool,
    },

    /// Check a sequence file without running it
    #[command(name = "validate")]
    Validate {
        /// Sequence definition (YAML)
        sequence: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The human readable summary
    Text,
    /// The full sequence status as JSON
    Json,
}
