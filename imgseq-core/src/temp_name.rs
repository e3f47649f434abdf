//! Temp-marked names used between the two rename phases.
//!
//! A temp-marked name is `<original stem>.__tmp__<32 hex chars><original extension>`,
//! placed in the same directory as the original so the rename stays on one
//! filesystem. Stripping the marker recovers the original name exactly.

use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

pub const TEMP_MARKER: &str = ".__tmp__";
pub const TEMP_SUFFIX_LEN: usize = 32;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fresh hex suffix. Unique per process call; collisions across processes
/// would need a SHA-256 prefix collision.
pub fn unique_suffix(seed: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_string_lossy().as_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
            .to_le_bytes(),
    );
    hasher.update(TEMP_COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..TEMP_SUFFIX_LEN].to_string()
}

/// Build a temp-marked sibling of `original`.
pub fn temp_path_for(original: &Path) -> PathBuf {
    temp_path_with_suffix(original, &unique_suffix(original))
}

pub(crate) fn temp_path_with_suffix(original: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = original.file_stem().map(OsString::from).unwrap_or_default();
    name.push(TEMP_MARKER);
    name.push(suffix);
    if let Some(ext) = original.extension() {
        name.push(".");
        name.push(ext);
    }
    original.with_file_name(name)
}

/// Recover the original path from a temp-marked path.
///
/// Returns `None` when the file name carries no valid marker or is not UTF-8.
pub fn original_path_for(temp: &Path) -> Option<PathBuf> {
    let name = temp.file_name()?.to_str()?;
    let original = strip_marker(name)?;
    Some(temp.with_file_name(original))
}

pub fn is_temp_marked(path: &Path) -> bool {
    original_path_for(path).is_some()
}

/// Remove the last `.__tmp__<hex>` marker from a file name.
fn strip_marker(name: &str) -> Option<String> {
    let start = name.rfind(TEMP_MARKER)?;
    let suffix_start = start + TEMP_MARKER.len();
    let rest = name.get(suffix_start..)?;
    let suffix = rest.get(..TEMP_SUFFIX_LEN)?;
    if !suffix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let tail = &rest[TEMP_SUFFIX_LEN..];
    // Whatever follows the suffix must be the original extension, if any.
    if !(tail.is_empty() || (tail.starts_with('.') && !tail[1..].contains('.'))) {
        return None;
    }
    let original = format!("{}{}", &name[..start], tail);
    if original.is_empty() {
        None
    } else {
        Some(original)
    }
}
