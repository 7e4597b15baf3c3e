//! Scoped change of the process working directory

use std::path::{Path, PathBuf};

/// Switches the process into a directory and switches back on drop.
///
/// The working directory is process-wide: hold the guard only around
/// synchronous code and never across an `.await`.
#[derive(Debug)]
pub struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    pub fn enter(dir: &Path) -> std::io::Result<Self> {
        let previous = std::env::current_dir()?;
        std::env::set_current_dir(dir)?;
        tracing::trace!("Entered {:?} (was {:?})", dir, previous);
        Ok(Self { previous })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::error!("Failed to restore working directory {:?}: {}", self.previous, e);
        }
    }
}
