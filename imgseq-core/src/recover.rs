use crate::listing::regular_files;
use crate::log::OperationLog;
use crate::retry::{rename_with_retry, RenameFs, RetryPolicy, StdFs};
use crate::temp_name::original_path_for;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A file left under a temp-marked name by an interrupted or failed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrandedFile {
    pub temp_path: PathBuf,
    pub original_path: PathBuf,
    /// Nothing occupied the original name when the directory was scanned
    pub slot_free: bool,
}

/// Find every temp-marked regular file directly inside `dir`, sorted by name.
pub fn find_stranded(dir: &Path) -> Result<Vec<StrandedFile>> {
    let mut files = regular_files(dir)?;
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files
        .into_iter()
        .filter_map(|temp_path| {
            let original_path = original_path_for(&temp_path)?;
            let slot_free = !StdFs.exists(&original_path);
            Some(StrandedFile {
                temp_path,
                original_path,
                slot_free,
            })
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoredFile {
    pub temp_path: PathBuf,
    pub original_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub temp_path: PathBuf,
    pub original_path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub restored: Vec<RestoredFile>,
    pub skipped: Vec<SkippedFile>,
}

impl RecoveryReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Move stranded files back to their original names.
///
/// The slot is checked again right before each rename, so a file is never
/// restored over something that appeared after the scan.
pub fn recover_stranded<F: RenameFs + ?Sized>(
    fs: &F,
    stranded: &[StrandedFile],
    policy: &RetryPolicy,
    log: &mut OperationLog,
) -> RecoveryReport {
    let mut report = RecoveryReport::default();

    for file in stranded {
        if fs.exists(&file.original_path) {
            log.log(&format!(
                "Not restoring {}: {} is occupied",
                file.temp_path.display(),
                file.original_path.display()
            ));
            report.skipped.push(SkippedFile {
                temp_path: file.temp_path.clone(),
                original_path: file.original_path.clone(),
                reason: "original name is occupied".to_string(),
            });
            continue;
        }

        match rename_with_retry(fs, &file.temp_path, &file.original_path, policy) {
            Ok(_) => {
                log.log(&format!(
                    "Restored {} -> {}",
                    file.temp_path.display(),
                    file.original_path.display()
                ));
                report.restored.push(RestoredFile {
                    temp_path: file.temp_path.clone(),
                    original_path: file.original_path.clone(),
                });
            },
            Err(err) => {
                log.log(&format!(
                    "Failed to restore {}: {}",
                    file.temp_path.display(),
                    err
                ));
                report.skipped.push(SkippedFile {
                    temp_path: file.temp_path.clone(),
                    original_path: file.original_path.clone(),
                    reason: err.to_string(),
                });
            },
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::tests::{invalid, ScriptedFs};
    use crate::temp_name::temp_path_for;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_and_recover_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let stranded_free = temp_path_for(&dir.join("a.jpg"));
        let stranded_taken = temp_path_for(&dir.join("b.jpg"));
        fs::write(&stranded_free, b"a").unwrap();
        fs::write(&stranded_taken, b"old b").unwrap();
        fs::write(dir.join("b.jpg"), b"new b").unwrap();
        fs::write(dir.join("c.jpg"), b"c").unwrap();

        let stranded = find_stranded(dir).unwrap();
        assert_eq!(stranded.len(), 2);
        let free = stranded.iter().find(|s| s.temp_path == stranded_free).unwrap();
        assert!(free.slot_free);
        assert_eq!(free.original_path, dir.join("a.jpg"));
        let taken = stranded.iter().find(|s| s.temp_path == stranded_taken).unwrap();
        assert!(!taken.slot_free);

        let report = recover_stranded(
            &StdFs,
            &stranded,
            &RetryPolicy::default(),
            &mut OperationLog::disabled(),
        );

        assert_eq!(report.restored.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, "original name is occupied");
        assert!(!report.is_clean());
        assert_eq!(fs::read(dir.join("a.jpg")).unwrap(), b"a");
        assert_eq!(fs::read(dir.join("b.jpg")).unwrap(), b"new b");
        assert!(stranded_taken.exists());
    }

    #[test]
    fn test_no_stranded_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.jpg"), b"a").unwrap();
        assert!(find_stranded(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_two_temps_for_one_original_restore_only_one() {
        let fs = ScriptedFs::with_files(&[
            "d/a.__tmp__00000000000000000000000000000000.jpg",
            "d/a.__tmp__11111111111111111111111111111111.jpg",
        ]);
        let stranded: Vec<StrandedFile> = fs
            .files
            .borrow()
            .iter()
            .map(|temp| StrandedFile {
                temp_path: temp.clone(),
                original_path: original_path_for(temp).unwrap(),
                slot_free: true,
            })
            .collect();

        let report = recover_stranded(
            &fs,
            &stranded,
            &RetryPolicy::without_delay(8),
            &mut OperationLog::disabled(),
        );

        assert_eq!(report.restored.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(fs.exists(Path::new("d/a.jpg")));
    }

    #[test]
    fn test_rename_failure_is_skipped_with_reason() {
        let temp = "d/a.__tmp__00000000000000000000000000000000.jpg";
        let fs = ScriptedFs::with_files(&[temp]);
        fs.fail(temp, invalid());

        let report = recover_stranded(
            &fs,
            &[StrandedFile {
                temp_path: PathBuf::from(temp),
                original_path: PathBuf::from("d/a.jpg"),
                slot_free: true,
            }],
            &RetryPolicy::without_delay(8),
            &mut OperationLog::disabled(),
        );

        assert!(report.restored.is_empty());
        assert_eq!(report.skipped[0].reason, "invalid path");
    }
}
