use crate::listing::entry_names;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Characters Windows refuses in file names. Enforced on every platform so a
/// planned name is portable.
pub const ILLEGAL_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Minimum number of digits in the sequence component.
pub const MIN_NUMBER_WIDTH: usize = 3;

/// Validity of one planned rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Ok,
    /// The new stem contains a reserved character
    IllegalName,
    /// An earlier row in the same batch already maps to this name
    DuplicateTarget,
    /// Another file in the directory already has this name
    ExistingConflict,
}

impl RowStatus {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::IllegalName => "illegal name",
            Self::DuplicateTarget => "duplicate target",
            Self::ExistingConflict => "conflicts with existing file",
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One planned rename and whether it may run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub status: RowStatus,
}

impl PreviewRow {
    /// True when executing this row would leave the file name unchanged.
    pub fn is_noop(&self) -> bool {
        self.old_path.file_name() == self.new_path.file_name()
    }
}

/// Case-folded names of every entry in a directory, taken once per batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    names: HashSet<String>,
}

impl DirectorySnapshot {
    /// Read the directory once. Later external changes are not observed.
    pub fn capture(dir: &Path) -> Result<Self> {
        Ok(Self::from_names(entry_names(dir)?))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| fold_case(n.as_ref())).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&fold_case(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

/// Zero-padding width for a batch of `count` files.
///
/// At least three digits, growing only once the count no longer fits.
pub fn number_width(count: usize) -> usize {
    MIN_NUMBER_WIDTH.max(count.max(1).to_string().len())
}

/// The extension of `path` including its leading dot, verbatim, or an empty
/// string when there is none.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// `prefix + zero_pad(index, width) + extension`
pub fn sequence_name(prefix: &str, index: usize, width: usize, extension: &str) -> String {
    format!("{prefix}{index:0width$}{extension}")
}

fn has_illegal_chars(stem: &str) -> bool {
    stem.contains(ILLEGAL_NAME_CHARS)
}

/// Plan the renames for `files` (already sorted) inside `dir`.
///
/// Lists the directory once to build the existing-name snapshot; fails only
/// when that listing fails. Invalid names never fail, they are reported in
/// each row's status.
pub fn plan_names(dir: &Path, files: &[PathBuf], prefix: &str) -> Result<Vec<PreviewRow>> {
    let snapshot = DirectorySnapshot::capture(dir)?;
    Ok(plan_names_with_snapshot(dir, files, prefix, &snapshot))
}

/// Plan against an explicit snapshot. Pure and deterministic.
pub fn plan_names_with_snapshot(
    dir: &Path,
    files: &[PathBuf],
    prefix: &str,
    snapshot: &DirectorySnapshot,
) -> Vec<PreviewRow> {
    let width = number_width(files.len());
    let planned = files.iter().enumerate().map(|(offset, old_path)| {
        let extension = dotted_extension(old_path);
        (
            old_path.clone(),
            sequence_name(prefix, offset + 1, width, &extension),
        )
    });
    validate_targets(dir, planned, snapshot)
}

/// Assign a status to each `(old_path, new_name)` pair, in order.
///
/// Precedence: illegal stem, then a target already claimed by an earlier
/// pair, then a clash with a file in the snapshot other than the pair's own
/// source.
pub fn validate_targets<I>(dir: &Path, planned: I, snapshot: &DirectorySnapshot) -> Vec<PreviewRow>
where
    I: IntoIterator<Item = (PathBuf, String)>,
{
    let mut seen_targets: HashSet<String> = HashSet::new();

    planned
        .into_iter()
        .map(|(old_path, new_name)| {
            let new_path = dir.join(&new_name);
            let new_stem = new_name
                .strip_suffix(dotted_extension(&old_path).as_str())
                .unwrap_or(&new_name);
            let folded = fold_case(&new_name);
            let old_folded = old_path
                .file_name()
                .map(|n| fold_case(&n.to_string_lossy()))
                .unwrap_or_default();

            // Record the target before deciding the status so a later pair
            // sees every earlier target, whatever status the earlier pair got.
            let first_occurrence = seen_targets.insert(folded.clone());

            let status = if has_illegal_chars(new_stem) {
                RowStatus::IllegalName
            } else if !first_occurrence {
                RowStatus::DuplicateTarget
            } else if folded != old_folded && snapshot.contains(&new_name) {
                RowStatus::ExistingConflict
            } else {
                RowStatus::Ok
            };

            PreviewRow {
                old_path,
                new_path,
                status,
            }
        })
        .collect()
}
