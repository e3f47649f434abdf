use super::{remove_empty_state_dir, resolve_directory, state_dir};
use crate::lock::LockFile;
use crate::log::OperationLog;
use crate::output::RecoverResult;
use crate::recover::{find_stranded, recover_stranded, RecoveryReport};
use crate::retry::{RetryPolicy, StdFs};
use anyhow::{Context, Result};
use std::path::Path;

/// Recover operation - moves stranded temp files back to their original names
pub fn recover_operation(
    dir: &Path,
    dry_run: bool,
    retry: &RetryPolicy,
    write_log: bool,
) -> Result<RecoverResult> {
    let directory = resolve_directory(dir)?;

    if dry_run {
        let stranded = find_stranded(&directory)?;
        return Ok(RecoverResult {
            directory,
            dry_run,
            stranded,
            report: RecoveryReport::default(),
        });
    }

    let state = state_dir(&directory);
    let lock = LockFile::acquire(&state).context("Failed to acquire lock for recover operation")?;

    let stranded = find_stranded(&directory)?;
    let mut log = if write_log && !stranded.is_empty() {
        let name = format!("recover-{}.log", chrono::Local::now().format("%Y%m%d-%H%M%S"));
        OperationLog::open(&state.join("logs").join(name))?
    } else {
        OperationLog::disabled()
    };

    let report = recover_stranded(&StdFs, &stranded, retry, &mut log);
    lock.release()?;
    remove_empty_state_dir(&directory);

    Ok(RecoverResult {
        directory,
        dry_run,
        stranded,
        report,
    })
}
