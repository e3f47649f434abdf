use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions recognized as images when no override is configured.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff", "webp"];

/// Lists image files in a single directory.
///
/// Only files directly inside the directory are returned (no recursion),
/// sorted ascending by file name. A symlink counts when it points at a file. The
/// listing is re-callable: the same directory state always yields the same
/// order, so it serves both the initial load and the refresh after a batch.
#[derive(Debug, Clone)]
pub struct DirectoryLister {
    extensions: HashSet<String>,
}

impl Default for DirectoryLister {
    fn default() -> Self {
        Self::with_extensions(DEFAULT_IMAGE_EXTENSIONS.iter().copied())
    }
}

impl DirectoryLister {
    /// Build a lister for a custom extension set. Leading dots and case are ignored.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    /// True when the path carries one of the recognized extensions.
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    /// List the recognized image files in `dir`, sorted by file name.
    pub fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = regular_files(dir)?
            .into_iter()
            .filter(|path| self.is_image(path))
            .collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

fn entries(dir: &Path) -> impl Iterator<Item = Result<walkdir::DirEntry>> + '_ {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .map(move |entry| entry.with_context(|| format!("Failed to list {}", dir.display())))
}

/// Every file directly inside `dir`, in no particular order. Symlinks are
/// followed, so a link to a file is included and a dangling link is not.
///
/// Any error while reading the directory fails the whole listing; there is no
/// partial result.
pub fn regular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in entries(dir) {
        let path = entry?.into_path();
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// The name of every entry directly inside `dir`, whatever its type.
///
/// Anything holding a name (file, directory, symlink, dangling or not) blocks
/// a rename onto that name.
pub fn entry_names(dir: &Path) -> Result<Vec<String>> {
    entries(dir)
        .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
        .collect()
}

/// List image files in `dir` with the default extension set.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    DirectoryLister::default().list(dir)
}
