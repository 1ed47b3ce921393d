//! Blocking filesystem helpers shared by the pipelines.
//!
//! These run on the blocking pool; callers wrap them in `spawn_blocking`.

use crate::{Error, Result};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: u64,
    pub bytes: u64,
}

/// Recursively copies the contents of `src` into `dst`, creating `dst`.
///
/// Directory structure is mirrored, file permissions and modification times
/// are carried over. Symlinks are skipped.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyStats> {
    let mut stats = CopyStats::default();
    fs::create_dir_all(dst)?;

    for entry in WalkDir::new(src).follow_links(false).min_depth(1) {
        let entry = entry.map_err(|e| Error::Other(format!("Failed to walk {}: {}", src.display(), e)))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::Other(e.to_string()))?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let bytes = fs::copy(entry.path(), &target)?;
            let metadata = entry.metadata().map_err(|e| Error::Other(e.to_string()))?;
            let mtime = FileTime::from_last_modification_time(&metadata);
            if let Err(e) = filetime::set_file_mtime(&target, mtime) {
                debug!(path = %target.display(), error = %e, "Could not preserve modification time");
            }
            stats.files += 1;
            stats.bytes += bytes;
        } else {
            warn!(path = %entry.path().display(), "Skipping symlink");
        }
    }

    Ok(stats)
}

/// Removes every entry under `dir`, leaving `dir` itself in place.
/// A missing `dir` is created empty.
pub fn clear_dir(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(removed)
}

/// Lists regular files under `root` as `/`-separated paths relative to it,
/// sorted for stable output.
pub fn relative_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Other(format!("Failed to walk {}: {}", root.display(), e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::Other(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(name);
    }
    Ok(files)
}
