use crate::planner::{PreviewRow, RowStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A rename the executor is allowed to perform.
///
/// Only built from rows whose status is OK and whose file name actually
/// changes, so the executor never sees a conflicting or no-op row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameMapping {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
}

impl RenameMapping {
    pub fn new(old_path: impl Into<PathBuf>, new_path: impl Into<PathBuf>) -> Self {
        Self {
            old_path: old_path.into(),
            new_path: new_path.into(),
        }
    }
}

/// True when any row would block execution.
pub fn has_conflicts(rows: &[PreviewRow]) -> bool {
    rows.iter().any(|row| !row.status.is_ok())
}

/// The mappings that need to run, in row order.
pub fn rename_mappings(rows: &[PreviewRow]) -> Vec<RenameMapping> {
    rows.iter()
        .filter(|row| row.status.is_ok() && !row.is_noop())
        .map(|row| RenameMapping::new(row.old_path.clone(), row.new_path.clone()))
        .collect()
}

/// How many rows carry each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictCounts {
    pub ok: usize,
    pub illegal_name: usize,
    pub duplicate_target: usize,
    pub existing_conflict: usize,
    /// OK rows whose name is already correct
    pub unchanged: usize,
}

impl ConflictCounts {
    pub fn blocking(&self) -> usize {
        self.illegal_name + self.duplicate_target + self.existing_conflict
    }
}

pub fn conflict_counts(rows: &[PreviewRow]) -> ConflictCounts {
    let mut counts = ConflictCounts::default();
    for row in rows {
        match row.status {
            RowStatus::Ok => {
                counts.ok += 1;
                if row.is_noop() {
                    counts.unchanged += 1;
                }
            },
            RowStatus::IllegalName => counts.illegal_name += 1,
            RowStatus::DuplicateTarget => counts.duplicate_target += 1,
            RowStatus::ExistingConflict => counts.existing_conflict += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(old: &str, new: &str, status: RowStatus) -> PreviewRow {
        PreviewRow {
            old_path: PathBuf::from(old),
            new_path: PathBuf::from(new),
            status,
        }
    }

    #[test]
    fn test_no_conflicts_when_all_ok() {
        let rows = vec![
            row("d/a.jpg", "d/x001.jpg", RowStatus::Ok),
            row("d/b.jpg", "d/x002.jpg", RowStatus::Ok),
        ];
        assert!(!has_conflicts(&rows));
        assert!(!has_conflicts(&[]));
    }

    #[test]
    fn test_any_non_ok_row_is_a_conflict() {
        for status in [
            RowStatus::IllegalName,
            RowStatus::DuplicateTarget,
            RowStatus::ExistingConflict,
        ] {
            let rows = vec![
                row("d/a.jpg", "d/x001.jpg", RowStatus::Ok),
                row("d/b.jpg", "d/x002.jpg", status),
            ];
            assert!(has_conflicts(&rows), "{status:?} should block");
        }
    }

    #[test]
    fn test_mappings_skip_noops_and_non_ok_rows() {
        let rows = vec![
            row("d/x001.jpg", "d/x001.jpg", RowStatus::Ok),
            row("d/b.jpg", "d/x002.jpg", RowStatus::Ok),
            row("d/c.jpg", "d/x003.jpg", RowStatus::ExistingConflict),
            row("d/x004.JPG", "d/x004.jpg", RowStatus::Ok),
        ];

        let mappings = rename_mappings(&rows);
        assert_eq!(
            mappings,
            vec![
                RenameMapping::new("d/b.jpg", "d/x002.jpg"),
                RenameMapping::new("d/x004.JPG", "d/x004.jpg"),
            ]
        );
    }

    #[test]
    fn test_conflict_counts() {
        let rows = vec![
            row("d/x001.jpg", "d/x001.jpg", RowStatus::Ok),
            row("d/b.jpg", "d/x002.jpg", RowStatus::Ok),
            row("d/c.jpg", "d/x003.jpg", RowStatus::ExistingConflict),
            row("d/e.jpg", "d/x:004.jpg", RowStatus::IllegalName),
        ];
        let counts = conflict_counts(&rows);
        assert_eq!(counts.ok, 2);
        assert_eq!(counts.unchanged, 1);
        assert_eq!(counts.existing_conflict, 1);
        assert_eq!(counts.illegal_name, 1);
        assert_eq!(counts.blocking(), 2);
    }
}
