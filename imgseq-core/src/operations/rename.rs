use super::{remove_empty_state_dir, resolve_directory, state_dir};
use crate::conflict::{conflict_counts, has_conflicts, rename_mappings};
use crate::executor::ExecuteOptions;
use crate::interrupt::{CancelToken, ConfirmationPromptGuard};
use crate::listing::DirectoryLister;
use crate::lock::LockFile;
use crate::log::OperationLog;
use crate::output::RenameReport;
use crate::planner::plan_names;
use crate::preview::{render_rows, Preview};
use crate::progress::{spawn_batch, Generation, Progress};
use crate::recover::find_stranded;
use crate::retry::{RetryPolicy, StdFs};
use crate::summary::RenameSummary;
use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use std::io::{self, IsTerminal, Write as IoWrite};
use std::path::Path;

/// Everything a rename batch needs besides the directory.
#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub prefix: String,
    pub dry_run: bool,
    /// Skip the confirmation prompt
    pub auto_approve: bool,
    /// Preview printed before the prompt
    pub preview: Preview,
    pub use_color: bool,
    pub lister: DirectoryLister,
    pub retry: RetryPolicy,
    pub write_log: bool,
    pub cancel: Option<CancelToken>,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            dry_run: false,
            auto_approve: false,
            preview: Preview::None,
            use_color: false,
            lister: DirectoryLister::default(),
            retry: RetryPolicy::default(),
            write_log: true,
            cancel: None,
        }
    }
}

/// Rename operation - plans, confirms, executes and re-lists
pub fn rename_operation(
    dir: &Path,
    options: &RenameOptions,
    on_progress: impl FnMut(Progress),
) -> Result<RenameReport> {
    let directory = resolve_directory(dir)?;
    let result = rename_locked(&directory, options, on_progress);
    if !options.dry_run {
        // Runs on every exit path, after the lock is gone
        remove_empty_state_dir(&directory);
    }
    result
}

fn rename_locked(
    directory: &Path,
    options: &RenameOptions,
    on_progress: impl FnMut(Progress),
) -> Result<RenameReport> {
    // The lock covers planning too, so the plan cannot go stale under another batch
    let lock = if options.dry_run {
        None
    } else {
        Some(
            LockFile::acquire(&state_dir(directory))
                .context("Failed to acquire lock for rename operation")?,
        )
    };

    // Renaming a temp-marked file into the sequence would lose its original name
    let stranded = find_stranded(directory)?;
    if !stranded.is_empty() {
        return Err(anyhow!(
            "{} files are still under temp names from an earlier batch. \
            Run `imgseq recover` before renaming.",
            stranded.len()
        ));
    }

    let files = options.lister.list(directory)?;
    let rows = plan_names(directory, &files, &options.prefix)
        .with_context(|| format!("Failed to plan names in {}", directory.display()))?;

    if has_conflicts(&rows) {
        let counts = conflict_counts(&rows);
        return Err(anyhow!(
            "{} of {} planned names conflict ({} illegal, {} duplicate, {} existing). \
            Run `imgseq preview` to see them.",
            counts.blocking(),
            rows.len(),
            counts.illegal_name,
            counts.duplicate_target,
            counts.existing_conflict
        ));
    }

    let mappings = rename_mappings(&rows);
    let mut report = RenameReport {
        batch_id: batch_id(directory, &options.prefix),
        directory: directory.to_path_buf(),
        prefix: options.prefix.clone(),
        dry_run: options.dry_run,
        aborted: false,
        planned: mappings.len(),
        results: Vec::new(),
        summary: RenameSummary::default(),
        files_after: None,
        log_path: None,
    };

    if mappings.is_empty() {
        return Ok(report);
    }

    if options.preview != Preview::None {
        let preview = render_rows(&rows, options.preview, Some(options.use_color));
        println!("{}", preview.trim_end());
    }

    if options.dry_run {
        return Ok(report);
    }

    if !options.auto_approve {
        if !io::stdin().is_terminal() {
            return Err(anyhow!(
                "Cannot prompt for confirmation in non-interactive mode. Use --yes to proceed."
            ));
        }
        if !get_user_confirmation(mappings.len())? {
            report.aborted = true;
            return Ok(report);
        }
    }

    let log = if options.write_log {
        OperationLog::open(
            &state_dir(directory)
                .join("logs")
                .join(format!("{}.log", report.batch_id)),
        )?
    } else {
        OperationLog::disabled()
    };
    report.log_path = log.path().map(Path::to_path_buf);

    let execute = ExecuteOptions {
        retry: options.retry,
        cancel: options.cancel.as_ref().map(CancelToken::flag),
    };
    let handle = spawn_batch(StdFs, mappings, execute, log, &Generation::new())?;
    let outcome = handle
        .wait(on_progress)?
        .ok_or_else(|| anyhow!("Rename batch finished without reporting a result"))?;

    report.results = outcome.results;
    report.summary = outcome.summary;
    report.files_after = Some(options.lister.list(directory)?.len());

    if let Some(lock) = lock {
        lock.release()?;
    }

    Ok(report)
}

fn get_user_confirmation(count: usize) -> Result<bool> {
    let _guard = ConfirmationPromptGuard::activate();
    print!("Rename {count} files? [y/N]: ");
    IoWrite::flush(&mut io::stdout()).context("Failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;
    let input = input.trim().to_lowercase();

    Ok(input == "y" || input == "yes")
}

/// Short id naming a batch and its log file.
fn batch_id(directory: &Path, prefix: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(directory.to_string_lossy().as_bytes());
    hasher.update(prefix.as_bytes());
    hasher.update(
        chrono::Local::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_le_bytes(),
    );
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}
