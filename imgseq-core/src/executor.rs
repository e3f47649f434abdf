use crate::conflict::RenameMapping;
use crate::error::RenameError;
use crate::log::OperationLog;
use crate::progress::{Progress, ProgressSink};
use crate::retry::{rename_with_retry, RenameFs, RetryPolicy, StdFs};
use crate::temp_name::{original_path_for, temp_path_for};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Options for running a two-phase rename batch
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Backoff for transient rename failures
    pub retry: RetryPolicy,
    /// Checked before each mapping leaves its original name. Mappings already
    /// under a temp name always finish.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// What happened when a failed phase-B rename was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RollbackNote {
    /// The file is back under its original name
    Restored { path: PathBuf },
    /// The original name was taken; the file stays under its temp name
    SlotOccupied {
        temp_path: PathBuf,
        original_path: PathBuf,
    },
    /// Renaming back failed; the file stays under its temp name
    Failed { temp_path: PathBuf, error: String },
}

impl RollbackNote {
    /// Where the file is now.
    pub fn current_path(&self) -> &Path {
        match self {
            Self::Restored { path } => path,
            Self::SlotOccupied { temp_path, .. } | Self::Failed { temp_path, .. } => temp_path,
        }
    }

    pub fn is_restored(&self) -> bool {
        matches!(self, Self::Restored { .. })
    }
}

/// Outcome of one mapping.
///
/// On success both reported paths are the settled target. On a phase-B
/// failure `reported_old` is wherever the file ended up: its original name
/// when the rollback worked, its temp name otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameResult {
    /// The mapping's original path, for correlating results with input
    pub source: PathBuf,
    pub reported_old: PathBuf,
    pub reported_new: PathBuf,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback: Option<RollbackNote>,
}

impl RenameResult {
    fn succeeded(source: &Path, target: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            reported_old: target.to_path_buf(),
            reported_new: target.to_path_buf(),
            success: true,
            error: None,
            rollback: None,
        }
    }

    fn failed(source: &Path, reported_old: &Path, target: &Path, error: String) -> Self {
        Self {
            source: source.to_path_buf(),
            reported_old: reported_old.to_path_buf(),
            reported_new: target.to_path_buf(),
            success: false,
            error: Some(error),
            rollback: None,
        }
    }
}

/// A mapping that made it through phase A.
struct Staged {
    source: PathBuf,
    temp: PathBuf,
    target: PathBuf,
}

/// Counts progress units and forwards them to the sink.
struct Ticker<'s> {
    completed: usize,
    total: usize,
    sink: &'s mut dyn ProgressSink,
}

impl Ticker<'_> {
    fn tick(&mut self) {
        self.completed += 1;
        self.sink.tick(Progress {
            completed: self.completed,
            total: self.total,
        });
    }
}

/// Renames a batch without ever letting two files collide.
///
/// Phase A moves every source to a unique temp-marked name; phase B, which
/// starts only once phase A has been attempted for every mapping, moves each
/// temp name to its final target. Any order of sources and targets inside the
/// batch (swaps, cycles) is therefore safe.
pub struct RenameExecutor<'a, F: RenameFs + ?Sized> {
    fs: &'a F,
    options: ExecuteOptions,
    log: OperationLog,
}

impl<'a, F: RenameFs + ?Sized> RenameExecutor<'a, F> {
    pub fn new(fs: &'a F, options: ExecuteOptions) -> Self {
        Self {
            fs,
            options,
            log: OperationLog::disabled(),
        }
    }

    #[must_use]
    pub fn with_log(mut self, log: OperationLog) -> Self {
        self.log = log;
        self
    }

    /// Hand the log back, e.g. to report where it was written.
    pub fn into_log(self) -> OperationLog {
        self.log
    }

    /// Run the batch. Yields exactly one result per mapping and exactly two
    /// progress ticks per mapping, whatever fails.
    pub fn run(
        &mut self,
        mappings: &[RenameMapping],
        progress: &mut dyn ProgressSink,
    ) -> Vec<RenameResult> {
        let mut ticker = Ticker {
            completed: 0,
            total: mappings.len() * 2,
            sink: progress,
        };
        let mut results = Vec::with_capacity(mappings.len());
        let mut staged = Vec::with_capacity(mappings.len());

        self.log
            .log(&format!("Starting two-phase rename of {} files", mappings.len()));

        for mapping in mappings {
            if self.cancel_requested() {
                self.log.log(&format!(
                    "Skipping {} (cancelled)",
                    mapping.old_path.display()
                ));
                results.push(RenameResult::failed(
                    &mapping.old_path,
                    &mapping.old_path,
                    &mapping.new_path,
                    RenameError::Cancelled.to_string(),
                ));
                ticker.tick();
                ticker.tick();
                continue;
            }

            match self.stage(mapping) {
                Ok(entry) => staged.push(entry),
                Err(err) => {
                    self.log.log(&format!(
                        "Phase A failed for {}: {}",
                        mapping.old_path.display(),
                        err
                    ));
                    results.push(RenameResult::failed(
                        &mapping.old_path,
                        &mapping.old_path,
                        &mapping.new_path,
                        format!("phase A failed: {err}"),
                    ));
                    // Its phase B step is skipped but still counted
                    ticker.tick();
                },
            }
            ticker.tick();
        }

        for entry in staged {
            results.push(self.settle(&entry));
            ticker.tick();
        }

        let failed = results.iter().filter(|r| !r.success).count();
        self.log.log(&format!(
            "Finished: {} succeeded, {} failed",
            results.len() - failed,
            failed
        ));

        results
    }

    fn cancel_requested(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Phase A: move the source out of the way.
    fn stage(&mut self, mapping: &RenameMapping) -> Result<Staged, RenameError> {
        let temp = temp_path_for(&mapping.old_path);
        let attempts = rename_with_retry(self.fs, &mapping.old_path, &temp, &self.options.retry)?;
        self.log.log(&format!(
            "Staged {} -> {}{}",
            mapping.old_path.display(),
            temp.display(),
            retry_suffix(attempts)
        ));
        Ok(Staged {
            source: mapping.old_path.clone(),
            temp,
            target: mapping.new_path.clone(),
        })
    }

    /// Phase B: move the temp name onto the target, rolling back on failure.
    fn settle(&mut self, entry: &Staged) -> RenameResult {
        let outcome = if self.fs.exists(&entry.target) {
            Err(RenameError::TargetExists(entry.target.clone()))
        } else {
            rename_with_retry(self.fs, &entry.temp, &entry.target, &self.options.retry)
        };

        match outcome {
            Ok(attempts) => {
                self.log.log(&format!(
                    "Renamed {} -> {}{}",
                    entry.source.display(),
                    entry.target.display(),
                    retry_suffix(attempts)
                ));
                RenameResult::succeeded(&entry.source, &entry.target)
            },
            Err(err) => {
                self.log.log(&format!(
                    "Phase B failed for {}: {}",
                    entry.target.display(),
                    err
                ));
                let note = self.roll_back(entry);
                let mut result = RenameResult::failed(
                    &entry.source,
                    note.current_path(),
                    &entry.target,
                    format!("phase B failed: {err}"),
                );
                result.rollback = Some(note);
                result
            },
        }
    }

    /// Best effort: one attempt (with retries) to put the file back. Never fails.
    fn roll_back(&mut self, entry: &Staged) -> RollbackNote {
        let original = original_path_for(&entry.temp).unwrap_or_else(|| entry.source.clone());

        let note = if self.fs.exists(&original) {
            RollbackNote::SlotOccupied {
                temp_path: entry.temp.clone(),
                original_path: original,
            }
        } else {
            match rename_with_retry(self.fs, &entry.temp, &original, &self.options.retry) {
                Ok(_) => RollbackNote::Restored { path: original },
                Err(err) => RollbackNote::Failed {
                    temp_path: entry.temp.clone(),
                    error: err.to_string(),
                },
            }
        };

        match &note {
            RollbackNote::Restored { path } => {
                self.log
                    .log(&format!("Rolled back to {}", path.display()));
            },
            RollbackNote::SlotOccupied {
                temp_path,
                original_path,
            } => {
                self.log.log(&format!(
                    "Rollback skipped, {} is occupied; file left at {}",
                    original_path.display(),
                    temp_path.display()
                ));
            },
            RollbackNote::Failed { temp_path, error } => {
                self.log.log(&format!(
                    "Rollback failed ({}); file left at {}",
                    error,
                    temp_path.display()
                ));
            },
        }

        note
    }
}

fn retry_suffix(attempts: u32) -> String {
    if attempts > 1 {
        format!(" after {attempts} attempts")
    } else {
        String::new()
    }
}

/// Run a batch on the real filesystem with default options.
pub fn two_phase_rename(
    mappings: &[RenameMapping],
    progress: &mut dyn ProgressSink,
) -> Vec<RenameResult> {
    RenameExecutor::new(&StdFs, ExecuteOptions::default()).run(mappings, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::retry::tests::{invalid, locked, ScriptedFs};
    use std::fs;
    use tempfile::TempDir;

    fn fast_options() -> ExecuteOptions {
        ExecuteOptions {
            retry: RetryPolicy::without_delay(8),
            cancel: None,
        }
    }

    fn mapping(old: &str, new: &str) -> RenameMapping {
        RenameMapping::new(old, new)
    }

    fn run_scripted(fs: &ScriptedFs, mappings: &[RenameMapping]) -> (Vec<RenameResult>, Vec<Progress>) {
        let mut ticks = Vec::new();
        let mut sink = |p: Progress| ticks.push(p);
        let results = RenameExecutor::new(fs, fast_options()).run(mappings, &mut sink);
        (results, ticks)
    }

    /// The temp path the executor staged `source` under.
    fn staged_temp(fs: &ScriptedFs, source: &str) -> PathBuf {
        fs.calls
            .borrow()
            .iter()
            .find(|(from, _)| from == Path::new(source))
            .map(|(_, to)| to.clone())
            .unwrap()
    }

    #[test]
    fn test_swap_on_real_filesystem() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.jpg");
        let b = temp_dir.path().join("b.jpg");
        fs::write(&a, b"A").unwrap();
        fs::write(&b, b"B").unwrap();

        let results = two_phase_rename(
            &[
                RenameMapping::new(&a, &b),
                RenameMapping::new(&b, &a),
            ],
            &mut NoProgress,
        );

        assert!(results.iter().all(|r| r.success));
        assert_eq!(fs::read(&a).unwrap(), b"B");
        assert_eq!(fs::read(&b).unwrap(), b"A");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_success_reports_target_twice() {
        let fs = ScriptedFs::with_files(&["d/a.jpg"]);
        let (results, _) = run_scripted(&fs, &[mapping("d/a.jpg", "d/x001.jpg")]);

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(result.success);
        assert_eq!(result.source, PathBuf::from("d/a.jpg"));
        assert_eq!(result.reported_old, PathBuf::from("d/x001.jpg"));
        assert_eq!(result.reported_new, PathBuf::from("d/x001.jpg"));
        assert!(result.error.is_none());
        assert!(fs.exists(Path::new("d/x001.jpg")));
    }

    #[test]
    fn test_progress_ticks_twice_per_mapping() {
        let fs = ScriptedFs::with_files(&["d/a.jpg", "d/b.jpg", "d/c.jpg"]);
        fs.fail("d/b.jpg", invalid());

        let (results, ticks) = run_scripted(
            &fs,
            &[
                mapping("d/a.jpg", "d/x001.jpg"),
                mapping("d/b.jpg", "d/x002.jpg"),
                mapping("d/c.jpg", "d/x003.jpg"),
            ],
        );

        assert_eq!(results.len(), 3);
        assert_eq!(ticks.len(), 6);
        assert!(ticks.iter().all(|p| p.total == 6));
        let completed: Vec<usize> = ticks.iter().map(|p| p.completed).collect();
        assert_eq!(completed, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_phase_a_failure_is_isolated() {
        let fs = ScriptedFs::with_files(&["d/a.jpg", "d/b.jpg"]);
        fs.fail("d/a.jpg", invalid());

        let (results, _) = run_scripted(
            &fs,
            &[mapping("d/a.jpg", "d/x001.jpg"), mapping("d/b.jpg", "d/x002.jpg")],
        );

        // Phase A failures come first, then phase B results
        assert!(!results[0].success);
        assert_eq!(results[0].source, PathBuf::from("d/a.jpg"));
        assert_eq!(results[0].reported_old, PathBuf::from("d/a.jpg"));
        assert_eq!(results[0].reported_new, PathBuf::from("d/x001.jpg"));
        assert!(results[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("phase A failed: invalid path"));
        assert!(results[1].success);
        assert!(fs.exists(Path::new("d/a.jpg")));
        assert!(fs.exists(Path::new("d/x002.jpg")));
    }

    #[test]
    fn test_phase_a_retries_transient_lock() {
        let fs = ScriptedFs::with_files(&["d/a.jpg"]);
        fs.fail("d/a.jpg", locked());
        fs.fail("d/a.jpg", locked());

        let (results, ticks) = run_scripted(&fs, &[mapping("d/a.jpg", "d/x001.jpg")]);

        assert!(results[0].success);
        assert_eq!(ticks.len(), 2);
        assert_eq!(fs.calls.borrow().len(), 4);
    }

    #[test]
    fn test_phase_b_failure_rolls_back_to_free_slot() {
        let fs = ScriptedFs::with_files(&["d/a.jpg"]);
        // Stage a.jpg, then make the temp -> target rename fail permanently
        let (results, ticks) = {
            let mut ticks = Vec::new();
            let mut sink = |p: Progress| {
                ticks.push(p);
                if p.completed == 1 {
                    let temp = staged_temp(&fs, "d/a.jpg");
                    fs.fail(temp, invalid());
                }
            };
            let results = RenameExecutor::new(&fs, fast_options())
                .run(&[mapping("d/a.jpg", "d/x001.jpg")], &mut sink);
            (results, ticks)
        };

        assert_eq!(ticks.len(), 2);
        let result = &results[0];
        assert!(!result.success);
        assert_eq!(result.reported_old, PathBuf::from("d/a.jpg"));
        assert_eq!(result.reported_new, PathBuf::from("d/x001.jpg"));
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .starts_with("phase B failed:"));
        assert_eq!(
            result.rollback,
            Some(RollbackNote::Restored {
                path: PathBuf::from("d/a.jpg")
            })
        );
        assert!(fs.exists(Path::new("d/a.jpg")));
        assert!(!fs.exists(Path::new("d/x001.jpg")));
    }

    #[test]
    fn test_target_appearing_mid_batch_is_not_overwritten() {
        let fs = ScriptedFs::with_files(&["d/a.jpg"]);
        let results = {
            let mut sink = |p: Progress| {
                if p.completed == 1 {
                    // Another process creates the target between phases
                    fs.files.borrow_mut().push(PathBuf::from("d/x001.jpg"));
                }
            };
            RenameExecutor::new(&fs, fast_options())
                .run(&[mapping("d/a.jpg", "d/x001.jpg")], &mut sink)
        };

        let result = &results[0];
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("phase B failed: target already exists: d/x001.jpg")
        );
        assert!(result.rollback.as_ref().unwrap().is_restored());
        // Only the stage and the rollback touched the filesystem
        assert_eq!(fs.calls.borrow().len(), 2);
        assert!(fs.exists(Path::new("d/a.jpg")));
    }

    #[test]
    fn test_rollback_with_occupied_slot_strands_file_at_temp() {
        let fs = ScriptedFs::with_files(&["d/a.jpg"]);
        let results = {
            let mut sink = |p: Progress| {
                if p.completed == 1 {
                    let temp = staged_temp(&fs, "d/a.jpg");
                    fs.fail(temp, invalid());
                    // Something takes the original name meanwhile
                    fs.files.borrow_mut().push(PathBuf::from("d/a.jpg"));
                }
            };
            RenameExecutor::new(&fs, fast_options())
                .run(&[mapping("d/a.jpg", "d/x001.jpg")], &mut sink)
        };

        let temp = staged_temp(&fs, "d/a.jpg");
        let result = &results[0];
        assert!(!result.success);
        assert_eq!(result.reported_old, temp);
        assert_eq!(
            result.rollback,
            Some(RollbackNote::SlotOccupied {
                temp_path: temp.clone(),
                original_path: PathBuf::from("d/a.jpg"),
            })
        );
        assert!(fs.exists(&temp));
    }

    #[test]
    fn test_rollback_failure_is_only_a_note() {
        let fs = ScriptedFs::with_files(&["d/a.jpg"]);
        let results = {
            let mut sink = |p: Progress| {
                if p.completed == 1 {
                    let temp = staged_temp(&fs, "d/a.jpg");
                    fs.fail(&temp, invalid());
                    fs.fail(&temp, io_error("disk vanished"));
                }
            };
            RenameExecutor::new(&fs, fast_options())
                .run(&[mapping("d/a.jpg", "d/x001.jpg")], &mut sink)
        };

        let result = &results[0];
        assert!(!result.success);
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .contains("invalid path"));
        match result.rollback.as_ref().unwrap() {
            RollbackNote::Failed { error, .. } => assert_eq!(error, "disk vanished"),
            other => panic!("unexpected rollback note: {other:?}"),
        }
    }

    fn io_error(message: &str) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, message.to_string())
    }

    #[test]
    fn test_cancellation_skips_unstarted_mappings() {
        let fs = ScriptedFs::with_files(&["d/a.jpg", "d/b.jpg", "d/c.jpg"]);
        let cancel = Arc::new(AtomicBool::new(false));
        let options = ExecuteOptions {
            retry: RetryPolicy::without_delay(8),
            cancel: Some(Arc::clone(&cancel)),
        };

        let mut ticks = Vec::new();
        let results = {
            let mut sink = |p: Progress| {
                ticks.push(p);
                if p.completed == 1 {
                    cancel.store(true, Ordering::SeqCst);
                }
            };
            RenameExecutor::new(&fs, options).run(
                &[
                    mapping("d/a.jpg", "d/x001.jpg"),
                    mapping("d/b.jpg", "d/x002.jpg"),
                    mapping("d/c.jpg", "d/x003.jpg"),
                ],
                &mut sink,
            )
        };

        assert_eq!(results.len(), 3);
        assert_eq!(ticks.len(), 6);
        // The staged mapping still finishes
        let done: Vec<_> = results.iter().filter(|r| r.success).collect();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].reported_new, PathBuf::from("d/x001.jpg"));
        let cancelled = results
            .iter()
            .filter(|r| r.error.as_deref() == Some("cancelled before rename started"))
            .count();
        assert_eq!(cancelled, 2);
        assert!(fs.exists(Path::new("d/b.jpg")));
        assert!(fs.exists(Path::new("d/c.jpg")));
    }

    #[test]
    fn test_log_records_each_step() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("batch.log");
        let fs = ScriptedFs::with_files(&["d/a.jpg"]);

        let mut executor = RenameExecutor::new(&fs, fast_options())
            .with_log(OperationLog::open(&log_path).unwrap());
        executor.run(&[mapping("d/a.jpg", "d/x001.jpg")], &mut NoProgress);
        drop(executor.into_log());

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("Starting two-phase rename of 1 files"));
        assert!(content.contains("Staged d/a.jpg -> d/a.__tmp__"));
        assert!(content.contains("Renamed d/a.jpg -> d/x001.jpg"));
        assert!(content.contains("Finished: 1 succeeded, 0 failed"));
    }

    #[test]
    fn test_empty_batch() {
        let fs = ScriptedFs::default();
        let (results, ticks) = run_scripted(&fs, &[]);
        assert!(results.is_empty());
        assert!(ticks.is_empty());
    }
}
