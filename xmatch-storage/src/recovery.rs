//! Session recovery: resuming interrupted identification runs.
//!
//! Work is always saved to the same un-numbered path, so a fresh run
//! checks that path first. Any file found there is backed up, then its
//! tag/flag/comment values are merged into the freshly loaded radio table
//! by catalogue ID. A saved row whose ID is missing from the catalogue is
//! a hard failure: the catalogue and save file have diverged and the
//! operator must reconcile them.

use crate::backup::backup_versioned;
use crate::error::{StorageError, StorageResult};
use crate::paths::file_accessible;
use crate::table::{read_raw_table, COMMENT_COLUMN, FLAG_COLUMN, TAG_COLUMN};
use std::path::Path;
use xmatch_core::RadioTable;

/// Merge a previous session's results into `table`.
///
/// Returns the number of recovered rows; zero when no save file exists.
pub fn resume_session(
    save_path: &Path,
    table: &mut RadioTable,
    id_column: &str,
) -> StorageResult<usize> {
    if !file_accessible(save_path) {
        tracing::debug!(path = %save_path.display(), "no previous save to recover");
        return Ok(0);
    }

    backup_versioned(save_path)?;
    let raw = read_raw_table(save_path)?;

    let id_index = raw.column_index(id_column, save_path)?;
    let tag_index = raw.column_index(TAG_COLUMN, save_path)?;
    let flag_index = raw.column_index(FLAG_COLUMN, save_path)?;
    let comment_index = raw.column_index(COMMENT_COLUMN, save_path)?;

    let mut recovered = 0;
    for (record_no, cells) in raw.records.iter().enumerate() {
        let id = &cells[id_index];
        let row = table
            .find_by_id(id)
            .ok_or_else(|| StorageError::UnknownSource { id: id.clone() })?;

        let flag = cells[flag_index]
            .parse::<u8>()
            .map_err(|e| StorageError::BadValue {
                column: FLAG_COLUMN.to_string(),
                value: cells[flag_index].clone(),
                line: record_no + 3,
                reason: e.to_string(),
            })?;

        let xid = &mut table.rows[row].xid;
        xid.tag = cells[tag_index].clone();
        xid.flag = flag;
        xid.comment = cells[comment_index].clone();

        tracing::debug!(id = %id, row, tag = %xid.tag, "recovered previous identification");
        recovered += 1;
    }

    tracing::info!(recovered, "recovered identifications from previous session");
    Ok(recovered)
}

// ============================================================================
// TESTS
// ============================================================================
