use super::resolve_directory;
use crate::listing::DirectoryLister;
use crate::output::ListResult;
use anyhow::Result;
use std::path::Path;

/// List operation - returns the image files in name order
pub fn list_operation(dir: &Path, lister: &DirectoryLister) -> Result<ListResult> {
    let directory = resolve_directory(dir)?;
    let files = lister.list(&directory)?;
    Ok(ListResult { directory, files })
}
