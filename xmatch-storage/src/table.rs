//! Fixed-width two-line table format.
//!
//! The persisted format is a plain-text table: a header line of column
//! names, a line of dashes marking each column's span, then one line per
//! row. Cells are sliced by the dash spans on read, so the format is
//! self-describing and the working columns keep their 53-character width
//! (the placeholder length is the width contract).
//!
//! ```text
//! ID     RA        DEC       xid_tag ...
//! ------ --------- --------- -------
//! EI0001 52.001000 -28.00000 ---...
//! ```

use crate::backup::backup_versioned;
use crate::error::{StorageError, StorageResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use xmatch_core::{Catalogue, CatalogueRow, RadioTable, TagStatus, TAG_WIDTH};

/// Working column holding the XID tag.
pub const TAG_COLUMN: &str = "xid_tag";
/// Working column holding the confidence flag.
pub const FLAG_COLUMN: &str = "xid_flag";
/// Working column holding the operator comment.
pub const COMMENT_COLUMN: &str = "xid_comment";

/// Configured names of the ID/RA/Dec columns of a catalogue file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBindings {
    pub id: String,
    pub ra: String,
    pub dec: String,
}

/// What a save attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { rows: usize, path: PathBuf },
    /// No rows carry results yet; nothing was written so a prior save is
    /// never clobbered with an empty table.
    NothingToSave,
}

/// A parsed table before any column interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str, path: &Path) -> StorageResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| StorageError::MissingColumn {
                column: name.to_string(),
                path: path.display().to_string(),
            })
    }
}

/// Read a fixed-width two-line table.
pub fn read_raw_table(path: &Path) -> StorageResult<RawTable> {
    let contents = std::fs::read_to_string(path)?;
    let mut lines = contents.lines();

    let header = lines.next().ok_or_else(|| malformed(path, "empty file"))?;
    let dashes = lines
        .next()
        .ok_or_else(|| malformed(path, "missing dash line"))?;
    let spans = dash_spans(dashes);
    if spans.is_empty() {
        return Err(malformed(path, "dash line has no column spans"));
    }

    let columns: Vec<String> = spans.iter().map(|s| slice_span(header, s)).collect();
    let records = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| spans.iter().map(|s| slice_span(line, s)).collect())
        .collect();

    Ok(RawTable { columns, records })
}

/// Read a catalogue file, binding the configured ID/RA/Dec columns.
pub fn read_catalogue(path: &Path, bindings: &ColumnBindings) -> StorageResult<Catalogue> {
    let raw = read_raw_table(path)?;
    let id_index = raw.column_index(&bindings.id, path)?;
    let ra_index = raw.column_index(&bindings.ra, path)?;
    let dec_index = raw.column_index(&bindings.dec, path)?;

    let mut rows = Vec::with_capacity(raw.records.len());
    for (record_no, cells) in raw.records.iter().enumerate() {
        let ra = parse_degrees(cells, ra_index, &bindings.ra, record_no)?;
        let dec = parse_degrees(cells, dec_index, &bindings.dec, record_no)?;
        rows.push(CatalogueRow {
            id: cells[id_index].clone(),
            ra,
            dec,
            cells: cells.clone(),
        });
    }

    tracing::info!(path = %path.display(), rows = rows.len(), "catalogue read");
    Ok(Catalogue {
        columns: raw.columns,
        rows,
    })
}

/// Persist the working table.
///
/// By default only rows carrying a result (a real tag or the skipped
/// sentinel) are written; `whole` writes every row, used for the final
/// save at end of catalogue. Any existing file at `path` is backed up to
/// the next free numbered slot first.
pub fn save_radio_table(
    path: &Path,
    table: &RadioTable,
    whole: bool,
) -> StorageResult<SaveOutcome> {
    let selected: Vec<usize> = (0..table.len())
        .filter(|&i| whole || table.status(i) != Some(TagStatus::Untouched))
        .collect();

    if selected.is_empty() {
        tracing::warn!("no data to save");
        return Ok(SaveOutcome::NothingToSave);
    }

    backup_versioned(path)?;

    let mut columns: Vec<String> = table.columns.clone();
    columns.push(TAG_COLUMN.to_string());
    columns.push(FLAG_COLUMN.to_string());
    columns.push(COMMENT_COLUMN.to_string());

    let records: Vec<Vec<String>> = selected
        .iter()
        .map(|&i| {
            let row = &table.rows[i];
            let mut cells: Vec<String> = (0..table.columns.len())
                .map(|c| row.source.cells.get(c).cloned().unwrap_or_default())
                .collect();
            // tag and comment are padded to the full placeholder width so
            // the columns honor the fixed-width contract even when no
            // placeholder row is in the written set
            cells.push(format!("{:<width$}", row.xid.tag, width = TAG_WIDTH));
            cells.push(row.xid.flag.to_string());
            cells.push(format!("{:<width$}", row.xid.comment, width = TAG_WIDTH));
            cells
        })
        .collect();

    write_raw_table(path, &columns, &records)?;
    tracing::info!(path = %path.display(), rows = records.len(), "table saved");
    Ok(SaveOutcome::Written {
        rows: records.len(),
        path: path.to_path_buf(),
    })
}

/// Write a fixed-width two-line table. No backup is taken; callers that
/// overwrite live data go through [`save_radio_table`].
pub fn write_raw_table(path: &Path, columns: &[String], records: &[Vec<String>]) -> StorageResult<()> {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(c, name)| {
            records
                .iter()
                .map(|cells| cells.get(c).map_or(0, |v| v.len()))
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, &width)| format!("{name:<width$}"))
        .collect();
    writeln!(out, "{}", header.join(" ").trim_end())?;

    let dashes: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    writeln!(out, "{}", dashes.join(" "))?;

    for cells in records {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(c, &width)| {
                let value = cells.get(c).map(String::as_str).unwrap_or("");
                format!("{value:<width$}")
            })
            .collect();
        writeln!(out, "{}", padded.join(" ").trim_end())?;
    }

    out.flush()?;
    Ok(())
}

/// Byte spans of the contiguous dash runs on the second line.
fn dash_spans(dashes: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (index, byte) in dashes.bytes().enumerate() {
        match (byte == b'-', start) {
            (true, None) => start = Some(index),
            (false, Some(s)) => {
                spans.push((s, index));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, dashes.len()));
    }
    spans
}

fn slice_span(line: &str, span: &(usize, usize)) -> String {
    let (start, end) = *span;
    line.get(start..end.min(line.len()))
        .unwrap_or("")
        .trim()
        .to_string()
}

fn parse_degrees(
    cells: &[String],
    index: usize,
    column: &str,
    record_no: usize,
) -> StorageResult<f64> {
    let value = cells.get(index).map(String::as_str).unwrap_or("");
    value.parse::<f64>().map_err(|e| StorageError::BadValue {
        column: column.to_string(),
        value: value.to_string(),
        // +3: one-based, after the header and dash lines
        line: record_no + 3,
        reason: e.to_string(),
    })
}

fn malformed(path: &Path, reason: &str) -> StorageError {
    StorageError::MalformedTable {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use xmatch_core::{XidTag, COMMENT_PLACEHOLDER, TAG_PLACEHOLDER, TAG_WIDTH};

    fn bindings() -> ColumnBindings {
        ColumnBindings {
            id: "ID".to_string(),
            ra: "RA".to_string(),
            dec: "DEC".to_string(),
        }
    }

    fn sample_table() -> RadioTable {
        let rows = vec![
            CatalogueRow {
                id: "EI0001".to_string(),
                ra: 52.001,
                dec: -28.1,
                cells: vec!["EI0001".to_string(), "52.001".to_string(), "-28.1".to_string()],
            },
            CatalogueRow {
                id: "EI0002".to_string(),
                ra: 52.044,
                dec: -28.2,
                cells: vec!["EI0002".to_string(), "52.044".to_string(), "-28.2".to_string()],
            },
        ];
        RadioTable::from_catalogue(Catalogue {
            columns: vec!["ID".to_string(), "RA".to_string(), "DEC".to_string()],
            rows,
        })
    }

    #[test]
    fn test_save_skips_when_nothing_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.dat");
        let table = sample_table();

        let outcome = save_radio_table(&path, &table, false).unwrap();

        assert_eq!(outcome, SaveOutcome::NothingToSave);
        assert!(!path.exists());
    }

    #[test]
    fn test_save_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.dat");
        let mut table = sample_table();
        table
            .commit(
                &[XidTag {
                    tag: "R*I*m1*C0".to_string(),
                    row: Some(0),
                }],
                2,
                Some("odd morphology"),
            )
            .unwrap();

        let outcome = save_radio_table(&path, &table, false).unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Written {
                rows: 1,
                path: path.clone()
            }
        );

        let raw = read_raw_table(&path).unwrap();
        assert_eq!(
            raw.columns,
            vec!["ID", "RA", "DEC", TAG_COLUMN, FLAG_COLUMN, COMMENT_COLUMN]
        );
        assert_eq!(raw.records.len(), 1);
        let record = &raw.records[0];
        assert_eq!(record[0], "EI0001");
        assert_eq!(record[3], "R*I*m1*C0");
        assert_eq!(record[4], "2");
        assert_eq!(record[5], "odd morphology");

        // the working columns keep their contract width even when no
        // placeholder-bearing row was written
        let contents = std::fs::read_to_string(&path).unwrap();
        let widths: Vec<usize> = contents.lines().nth(1).unwrap().split(' ').map(str::len).collect();
        assert_eq!(widths[3], TAG_WIDTH);
        assert_eq!(widths[5], TAG_WIDTH);
    }

    #[test]
    fn test_whole_save_writes_untouched_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.dat");
        let table = sample_table();

        let outcome = save_radio_table(&path, &table, true).unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::Written {
                rows: 2,
                path: path.clone()
            }
        );
        let raw = read_raw_table(&path).unwrap();
        assert_eq!(raw.records.len(), 2);
        assert_eq!(raw.records[0][3], TAG_PLACEHOLDER);
        assert_eq!(raw.records[1][5], COMMENT_PLACEHOLDER);
    }

    #[test]
    fn test_tag_and_comment_columns_are_full_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.dat");
        let table = sample_table();
        save_radio_table(&path, &table, true).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let dash_line = contents.lines().nth(1).unwrap();
        let widths: Vec<usize> = dash_line.split(' ').map(str::len).collect();
        assert_eq!(widths[3], TAG_WIDTH);
        assert_eq!(widths[5], TAG_WIDTH);
    }

    #[test]
    fn test_save_backs_up_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.dat");
        let table = sample_table();

        save_radio_table(&path, &table, true).unwrap();
        save_radio_table(&path, &table, true).unwrap();

        assert!(dir.path().join("table-bkp-01.dat").exists());
        assert!(!dir.path().join("table-bkp-02.dat").exists());
    }

    #[test]
    fn test_read_catalogue_binds_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radio.dat");
        let table = sample_table();
        save_radio_table(&path, &table, true).unwrap();

        let catalogue = read_catalogue(&path, &bindings()).unwrap();

        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue.rows[0].id, "EI0001");
        assert!((catalogue.rows[0].ra - 52.001).abs() < 1e-9);
        assert!((catalogue.rows[1].dec - -28.2).abs() < 1e-9);
        // full original row preserved, including working columns
        assert_eq!(catalogue.rows[0].cells[0], "EI0001");
    }

    #[test]
    fn test_read_catalogue_missing_column_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radio.dat");
        save_radio_table(&path, &sample_table(), true).unwrap();

        let bad = ColumnBindings {
            id: "NAME".to_string(),
            ra: "RA".to_string(),
            dec: "DEC".to_string(),
        };
        let err = read_catalogue(&path, &bad).unwrap_err();
        assert!(matches!(err, StorageError::MissingColumn { .. }));
    }

    #[test]
    fn test_read_catalogue_bad_coordinate_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radio.dat");
        std::fs::write(
            &path,
            "ID     RA     DEC\n------ ------ ------\nEI0001 nonsen -28.1\n",
        )
        .unwrap();

        let err = read_catalogue(&path, &bindings()).unwrap_err();
        assert!(matches!(err, StorageError::BadValue { line: 3, .. }));
    }

    #[test]
    fn test_read_raw_table_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radio.dat");
        std::fs::write(&path, "ID RA DEC\n").unwrap();

        let err = read_raw_table(&path).unwrap_err();
        assert!(matches!(err, StorageError::MalformedTable { .. }));
    }
}
