//! Error handling utilities

use tracing::error;

/// Exit code for a sequence whose aggregate status is `error`
pub const EXIT_SEQUENCE_FAILED: i32 = 1;
/// Exit code for problems before anything ran (bad file, bad arguments)
pub const EXIT_FATAL: i32 = 2;

/// Report a fatal error and exit
///
/// - `verbose = 0`: the top-level message only
/// - `verbose >= 1`: the full error chain
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);

    eprintln!("Error: {error}");
    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }

    std::process::exit(EXIT_FATAL)
}
