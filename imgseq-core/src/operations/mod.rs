//! High-level operations that correspond to CLI commands
//!
//! These modules contain the core business logic for each imgseq operation,
//! separated from CLI concerns like argument parsing and output formatting.

pub mod list;
pub mod preview;
pub mod recover;
pub mod rename;

pub use list::list_operation;
pub use preview::preview_operation;
pub use recover::recover_operation;
pub use rename::{rename_operation, RenameOptions};

use crate::config::CONFIG_DIR_NAME;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Canonicalize the target directory, failing early if it is not one.
pub(crate) fn resolve_directory(dir: &Path) -> Result<PathBuf> {
    let resolved = dir
        .canonicalize()
        .with_context(|| format!("Directory not found: {}", dir.display()))?;
    if !resolved.is_dir() {
        return Err(anyhow!("Not a directory: {}", dir.display()));
    }
    Ok(resolved)
}

/// Where imgseq keeps its lock and logs for `dir`.
pub fn state_dir(dir: &Path) -> PathBuf {
    dir.join(CONFIG_DIR_NAME)
}

/// Drop `<dir>/.imgseq` once the lock is gone, unless logs or config live there.
pub(crate) fn remove_empty_state_dir(dir: &Path) {
    // remove_dir refuses non-empty directories
    let _ = std::fs::remove_dir(state_dir(dir));
}
