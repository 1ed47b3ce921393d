//! Human-readable directory sizes.

use crate::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Sums the sizes of regular files under `path`.
///
/// Symlinks and entries that cannot be read contribute nothing; a missing
/// path sums to zero.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// `dir_size` on the blocking pool.
pub(crate) async fn measure(path: PathBuf) -> Result<u64> {
    Ok(tokio::task::spawn_blocking(move || dir_size(&path)).await?)
}

pub fn format_size(bytes: u64) -> String {
    if bytes < KB {
        format!("{} bytes", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    }
}

pub fn report_size(path: &Path) -> String {
    format_size(dir_size(path))
}
