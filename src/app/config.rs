//! Application configuration
//!
//! This module handles application-wide configuration settings.

use clap::ValueEnum;

/// How chatty the log output is, before `-v` flags are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogMode {
    /// Errors only
    Mute,
    /// Warnings and errors
    Silent,
    #[default]
    Normal,
    /// Everything down to debug
    Debug,
}

/// Application configuration structure
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Verbosity level for logging
    pub verbose: u8,
    pub log_mode: LogMode,
}

impl AppConfig {
    pub fn new(verbose: u8) -> Self {
        Self {
            verbose,
            log_mode: LogMode::default(),
        }
    }

    pub fn with_log_mode(mut self, log_mode: LogMode) -> Self {
        self.log_mode = log_mode;
        self
    }

    /// Get the log filter based on mode and verbosity
    pub fn log_level(&self) -> &'static str {
        match (self.log_mode, self.verbose) {
            (_, 2..) => "trace",
            (_, 1) | (LogMode::Debug, _) => "debug",
            (LogMode::Mute, _) => "error",
            (LogMode::Silent, _) => "warn",
            (LogMode::Normal, _) => "info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(AppConfig::new(0).log_level(), "info");
        assert_eq!(AppConfig::new(1).log_level(), "debug");
        assert_eq!(AppConfig::new(3).log_level(), "trace");
        assert_eq!(
            AppConfig::new(0).with_log_mode(LogMode::Mute).log_level(),
            "error"
        );
        assert_eq!(
            AppConfig::new(0).with_log_mode(LogMode::Silent).log_level(),
            "warn"
        );
        assert_eq!(
            AppConfig::new(0).with_log_mode(LogMode::Debug).log_level(),
            "debug"
        );
        // -v wins over a quiet mode
        assert_eq!(
            AppConfig::new(1).with_log_mode(LogMode::Mute).log_level(),
            "debug"
        );
    }
}
