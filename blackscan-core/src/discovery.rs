//! File discovery module for finding video files to analyze.
//!
//! Input paths may be files or directories. Directories are walked
//! recursively and filtered by a fixed video extension set; files are
//! accepted as given. The result is deduplicated and ordered: inputs keep
//! their given order, directory contents are sorted.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{CoreError, CoreResult};

/// Extensions treated as video containers (lowercase, with dot).
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mov", ".mkv", ".m4v", ".avi", ".mts", ".m2ts", ".webm", ".wmv", ".flv", ".ts",
    ".vob", ".mpg", ".mpeg",
];

/// Checks a path against [`VIDEO_EXTENSIONS`], case-insensitively.
#[must_use]
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lowered = format!(".{}", ext.to_ascii_lowercase());
            VIDEO_EXTENSIONS.contains(&lowered.as_str())
        })
        .unwrap_or(false)
}

/// Expands a mix of file and directory paths into the list of video files
/// to analyze.
///
/// Returns `CoreError::NoFilesFound` when nothing matches.
pub fn collect_video_files(inputs: &[PathBuf]) -> CoreResult<Vec<PathBuf>> {
    let mut seen: BTreeSet<PathBuf> = BTreeSet::new();
    let mut files: Vec<PathBuf> = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            walk_dir(input, &mut found)?;
            found.sort();
            for path in found {
                if seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        } else if input.is_file() && is_video_file(input) {
            let path = input.clone();
            if seen.insert(path.clone()) {
                files.push(path);
            }
        } else {
            debug!("skipping non-video input {}", input.display());
        }
    }

    if files.is_empty() {
        Err(CoreError::NoFilesFound)
    } else {
        Ok(files)
    }
}

fn walk_dir(dir: &Path, out: &mut Vec<PathBuf>) -> CoreResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, out)?;
        } else if path.is_file() && is_video_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}
