//! Numbered pre-write backups.
//!
//! Work is always saved to the same un-numbered path; before an existing
//! file is overwritten it is copied to `<basename>-bkp-<NN>.<ext>`, taking
//! the first unused number starting at 01. Existing backups are never
//! overwritten, so any bad save is recoverable by hand.

use crate::error::StorageResult;
use std::path::{Path, PathBuf};

/// Copy an existing file at `path` to its next free backup slot.
///
/// Returns the backup path, or `None` when there was nothing to back up.
pub fn backup_versioned(path: &Path) -> StorageResult<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    tracing::info!(path = %path.display(), "found a preexisting file, backing it up");
    let mut number = 1u32;
    let backup = loop {
        let candidate = numbered_path(path, number);
        if !candidate.exists() {
            break candidate;
        }
        tracing::debug!(backup = %candidate.display(), "backup slot taken");
        number += 1;
    };

    std::fs::copy(path, &backup)?;
    tracing::info!(backup = %backup.display(), "backed up");
    Ok(Some(backup))
}

fn numbered_path(path: &Path, number: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-bkp-{number:02}.{}", ext.to_string_lossy()),
        None => format!("{stem}-bkp-{number:02}"),
    };
    path.with_file_name(name)
}
