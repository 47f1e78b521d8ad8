//! Recursive expansion of the CLI's input list.
//!
//! [`create_file_list`] turns a mix of files and directories into a flat list
//! of regular files. Directories are walked with [`walkdir`] without
//! following symlinks, so cyclic links cannot loop. Files that already carry
//! `skip_suffix` are left out of directory walks (compressing a tree twice
//! must not produce `a.gz.gz`).

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Expand `inputs` into regular files.
///
/// Non-directory inputs are forwarded unchanged. Inside directories, only
/// entries whose `file_type().is_file()` holds are kept, minus names ending
/// in `skip_suffix` when one is given.
pub fn create_file_list(inputs: &[&Path], skip_suffix: Option<&str>) -> io::Result<Vec<PathBuf>> {
    let mut result = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            result.push(input.to_path_buf());
            continue;
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                e.io_error()
                    .map(|io| io::Error::new(io.kind(), io.to_string()))
                    .unwrap_or_else(|| io::Error::other(e.to_string()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let skipped = skip_suffix
                .is_some_and(|suffix| entry.file_name().to_string_lossy().ends_with(suffix));
            if skipped {
                tracing::debug!(path = %entry.path().display(), "already has the target suffix");
                continue;
            }
            result.push(entry.into_path());
        }
    }
    Ok(result)
}
