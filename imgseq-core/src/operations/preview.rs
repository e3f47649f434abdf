use super::resolve_directory;
use crate::conflict::{conflict_counts, has_conflicts};
use crate::listing::DirectoryLister;
use crate::output::PreviewResult;
use crate::planner::plan_names;
use crate::recover::find_stranded;
use anyhow::{Context, Result};
use std::path::Path;

/// Preview operation - plans names without touching the filesystem
pub fn preview_operation(dir: &Path, prefix: &str, lister: &DirectoryLister) -> Result<PreviewResult> {
    let directory = resolve_directory(dir)?;
    let files = lister.list(&directory)?;
    let rows = plan_names(&directory, &files, prefix)
        .with_context(|| format!("Failed to plan names in {}", directory.display()))?;
    let stranded = find_stranded(&directory)?;

    Ok(PreviewResult {
        counts: conflict_counts(&rows),
        has_conflicts: has_conflicts(&rows),
        directory,
        prefix: prefix.to_string(),
        rows,
        stranded,
    })
}
