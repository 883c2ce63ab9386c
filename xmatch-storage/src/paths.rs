//! Output folder and file helpers.

use crate::error::StorageResult;
use std::path::{Path, PathBuf};

/// Create a folder (and parents) if missing; returns the absolute path.
pub fn ensure_folder(path: &Path) -> StorageResult<PathBuf> {
    std::fs::create_dir_all(path)?;
    Ok(path.canonicalize()?)
}

/// Whether a file exists and is readable.
pub fn file_accessible(path: &Path) -> bool {
    std::fs::File::open(path).is_ok()
}
