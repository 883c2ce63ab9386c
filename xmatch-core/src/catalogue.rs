//! Catalogue tables and the radio working columns.
//!
//! Two catalogues exist per field: the infrared catalogue (read-only) and
//! the radio catalogue, which gains three working columns at session start
//! (`xid_tag`, `xid_flag`, `xid_comment`). The tag column doubles as the
//! row's completion state: untouched placeholder, skipped sentinel, or a
//! real generated tag.

use crate::identity::XidTag;
use serde::{Deserialize, Serialize};

/// Fixed width of the `xid_tag` and `xid_comment` columns.
///
/// The placeholder must be as long as the longest possible real tag so a
/// fixed-width persisted format never truncates one.
pub const TAG_WIDTH: usize = 53;

/// Tag value for rows that have never been attempted.
pub const TAG_PLACEHOLDER: &str = "-----------------------------------------------------";

/// Comment value for rows without an operator comment.
pub const COMMENT_PLACEHOLDER: &str = "-----------------------------------------------------";

/// Tag value for rows the operator deferred for a later tricky-mode pass.
pub const SKIPPED_PLACEHOLDER: &str = "---crossmatch_skipped-redo_by_running_with_-x_flag---";

/// Maximum operator comment length, matching the comment prompt's bound.
pub const COMMENT_LIMIT: usize = 53;

/// Radio host ID recorded when no radio core was selected.
pub const RADIO_HOST_SENTINEL: &str = "Rnohost";

/// Infrared host ID recorded when no infrared host was selected.
pub const INFRARED_HOST_SENTINEL: &str = "Inohost";

/// Radius of the pickable catalogue neighbourhood around a target.
pub const NEIGHBOURHOOD_ARCSEC: f64 = 240.0;

/// One catalogue entry.
///
/// `id`, `ra`, and `dec` are parsed out of the configured columns for
/// lookups and sky math; `cells` preserves the complete original row
/// verbatim, in column order, so the working table round-trips through
/// the persisted format without reformatting untouched columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueRow {
    pub id: String,
    /// Right ascension in decimal degrees.
    pub ra: f64,
    /// Declination in decimal degrees.
    pub dec: f64,
    pub cells: Vec<String>,
}

/// An ordered catalogue with its column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalogue {
    pub columns: Vec<String>,
    pub rows: Vec<CatalogueRow>,
}

impl Catalogue {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogueRow> {
        self.rows.get(index)
    }

    /// Indices of rows within `radius_arcsec` of the target coordinate.
    ///
    /// Used to limit plotting and picking to the sources actually near the
    /// rendered cutout.
    pub fn neighbourhood(&self, ra: f64, dec: f64, radius_arcsec: f64) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| angular_separation_arcsec(ra, dec, row.ra, row.dec) < radius_arcsec)
            .map(|(index, _)| index)
            .collect()
    }
}

/// Great-circle separation between two (RA, Dec) positions, in arcseconds.
///
/// Inputs are decimal degrees. Goes through unit vectors so it is stable
/// near the poles and across the RA wrap.
pub fn angular_separation_arcsec(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let a = radec_to_xyz(ra1.to_radians(), dec1.to_radians());
    let b = radec_to_xyz(ra2.to_radians(), dec2.to_radians());
    let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    dot.clamp(-1.0, 1.0).acos().to_degrees() * 3600.0
}

fn radec_to_xyz(ra: f64, dec: f64) -> [f64; 3] {
    let cos_dec = dec.cos();
    [cos_dec * ra.cos(), cos_dec * ra.sin(), dec.sin()]
}

/// Completion state of a radio row, derived from its tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStatus {
    /// Never attempted (placeholder tag).
    Untouched,
    /// Deferred by the operator for a tricky-mode pass.
    Skipped,
    /// Carries a real generated tag.
    Tagged,
}

/// The three working columns added to every radio row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XidColumns {
    pub tag: String,
    /// 0 = no identification recorded; 1-4 = operator confidence.
    pub flag: u8,
    pub comment: String,
}

impl Default for XidColumns {
    fn default() -> Self {
        Self {
            tag: TAG_PLACEHOLDER.to_string(),
            flag: 0,
            comment: COMMENT_PLACEHOLDER.to_string(),
        }
    }
}

impl XidColumns {
    pub fn status(&self) -> TagStatus {
        if self.tag == TAG_PLACEHOLDER {
            TagStatus::Untouched
        } else if self.tag == SKIPPED_PLACEHOLDER {
            TagStatus::Skipped
        } else {
            TagStatus::Tagged
        }
    }
}

/// A radio catalogue row together with its working columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioRow {
    pub source: CatalogueRow,
    pub xid: XidColumns,
}

/// The long-lived radio working table: the unit of persistence for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadioTable {
    pub columns: Vec<String>,
    pub rows: Vec<RadioRow>,
}

impl RadioTable {
    /// Attach default working columns to every row of a radio catalogue.
    pub fn from_catalogue(catalogue: Catalogue) -> Self {
        let rows = catalogue
            .rows
            .into_iter()
            .map(|source| RadioRow {
                source,
                xid: XidColumns::default(),
            })
            .collect();
        Self {
            columns: catalogue.columns,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RadioRow> {
        self.rows.get(index)
    }

    pub fn status(&self, index: usize) -> Option<TagStatus> {
        self.rows.get(index).map(|row| row.xid.status())
    }

    pub fn find_by_id(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.source.id == id)
    }

    /// Rows carrying a real generated tag (not placeholder, not skipped).
    pub fn tagged_indices(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.xid.status() == TagStatus::Tagged)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn tagged_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.xid.status() == TagStatus::Tagged)
            .count()
    }

    /// The most recent `limit` tagged rows, in table order.
    pub fn recent_tagged(&self, limit: usize) -> Vec<&RadioRow> {
        let tagged: Vec<&RadioRow> = self
            .rows
            .iter()
            .filter(|row| row.xid.status() == TagStatus::Tagged)
            .collect();
        let skip = tagged.len().saturating_sub(limit);
        tagged.into_iter().skip(skip).collect()
    }

    /// Mark a row as deferred for a later tricky-mode pass.
    ///
    /// Leaves flag and comment untouched so a prior identification attempt
    /// is not silently erased.
    pub fn mark_skipped(&mut self, index: usize) -> crate::error::CoreResult<()> {
        let len = self.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or(crate::error::CoreError::RowOutOfBounds { index, len })?;
        row.xid.tag = SKIPPED_PLACEHOLDER.to_string();
        Ok(())
    }

    /// Commit generated tags into the working columns.
    ///
    /// Each tag lands on its target row with the session confidence; the
    /// comment (if one was entered) lands on every target row, truncated
    /// to the column width. Tags without a concrete target row (degenerate
    /// no-host sessions) have nowhere to land and are dropped here.
    pub fn commit(
        &mut self,
        tags: &[XidTag],
        flag: u8,
        comment: Option<&str>,
    ) -> crate::error::CoreResult<()> {
        let len = self.len();
        for tag in tags {
            let Some(index) = tag.row else {
                tracing::warn!(tag = %tag.tag, "no target row for tag, not written");
                continue;
            };
            let row = self
                .rows
                .get_mut(index)
                .ok_or(crate::error::CoreError::RowOutOfBounds { index, len })?;
            row.xid.tag = tag.tag.clone();
            row.xid.flag = flag;
            if let Some(comment) = comment {
                if !comment.is_empty() {
                    row.xid.comment = comment.chars().take(COMMENT_LIMIT).collect();
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
