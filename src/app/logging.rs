//! Logging configuration and initialization

use crate::app::config::AppConfig;
use tracing::{debug, trace};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

/// Timestamps as `20240601 13:45:10`, local time
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactTimer;

impl FormatTime for CompactTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "[{}]", chrono::Local::now().format("%Y%m%d %H:%M:%S"))
    }
}

/// Initialize tracing/logging for the application
pub fn init_logging(config: &AppConfig) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(config.log_level())
        .with_timer(CompactTimer)
        .with_writer(std::io::stderr)
        .with_target(config.verbose >= 2)
        .with_line_number(config.verbose >= 3)
        .try_init();

    if result.is_err() {
        // A subscriber is already installed (tests, embedding applications)
        return;
    }

    debug!("Logging initialised at level {}", config.log_level());
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}
