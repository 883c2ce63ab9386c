//! Selected-source identity and XID tag derivation.
//!
//! One `Identity` lives for the duration of a single target's
//! identification session. It accumulates the operator's selections
//! (infrared host, radio host, radio components) and derives the XID tag
//! set on demand. Tags are strings of the form
//! `<radioHostID>*<infraredHostID>*m<count>*C<index>` where `C0` is the
//! radio core and `C1..` are its components. The `*` separator and field
//! order are an external contract; consumers split tags on `*`.

use crate::catalogue::{INFRARED_HOST_SENTINEL, RADIO_HOST_SENTINEL};
use serde::{Deserialize, Serialize};

/// Separator between tag fields. Never change: consumers parse on it.
pub const TAG_SEPARATOR: char = '*';

/// A selected catalogue entry, or the "no host" sentinel (`row: None`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostRef {
    pub id: String,
    pub row: Option<usize>,
}

impl HostRef {
    pub fn selected(id: impl Into<String>, row: usize) -> Self {
        Self {
            id: id.into(),
            row: Some(row),
        }
    }

    fn radio_sentinel() -> Self {
        Self {
            id: RADIO_HOST_SENTINEL.to_string(),
            row: None,
        }
    }

    fn infrared_sentinel() -> Self {
        Self {
            id: INFRARED_HOST_SENTINEL.to_string(),
            row: None,
        }
    }

    /// Whether this refers to an actual catalogue row rather than the
    /// sentinel.
    pub fn is_set(&self) -> bool {
        self.row.is_some()
    }
}

/// A derived tag and the radio-table row it should be written to.
///
/// `row` is `None` only for the degenerate no-radio-host core tag, which
/// has no row to land on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XidTag {
    pub tag: String,
    pub row: Option<usize>,
}

/// Outcome of a component selection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Accepted,
    /// The row is already a component or is the current radio host.
    AlreadySelected,
}

/// Accumulates one source's selections and derives its XID tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    infrared_host: HostRef,
    radio_host: HostRef,
    components: Vec<HostRef>,
    tags: Vec<XidTag>,
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl Identity {
    pub fn new() -> Self {
        Self {
            infrared_host: HostRef::infrared_sentinel(),
            radio_host: HostRef::radio_sentinel(),
            components: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn infrared_host(&self) -> &HostRef {
        &self.infrared_host
    }

    pub fn radio_host(&self) -> &HostRef {
        &self.radio_host
    }

    pub fn components(&self) -> &[HostRef] {
        &self.components
    }

    /// Last click wins; re-selection is not guarded.
    pub fn set_infrared_host(&mut self, id: impl Into<String>, row: usize) {
        self.infrared_host = HostRef::selected(id, row);
    }

    /// Last click wins; re-selection is not guarded.
    pub fn set_radio_host(&mut self, id: impl Into<String>, row: usize) {
        self.radio_host = HostRef::selected(id, row);
    }

    /// Append a radio component, unless the row is already selected as a
    /// component or as the radio host.
    pub fn add_component(&mut self, id: impl Into<String>, row: usize) -> Selection {
        let candidate = HostRef::selected(id, row);
        if candidate == self.radio_host || self.components.contains(&candidate) {
            tracing::warn!(id = %candidate.id, "source already selected");
            return Selection::AlreadySelected;
        }
        self.components.push(candidate);
        Selection::Accepted
    }

    /// Derive the XID tag set from the current selections.
    ///
    /// Safe to call repeatedly: previous results are cleared, never
    /// appended to. If no radio host was chosen but components exist, the
    /// first-clicked component is promoted to radio core before
    /// derivation.
    pub fn generate_tags(&mut self) -> &[XidTag] {
        self.tags.clear();

        if !self.radio_host.is_set() && !self.components.is_empty() {
            tracing::warn!("no radio core selected, promoting first component");
            self.radio_host = self.components.remove(0);
        }

        let component_count = if self.radio_host.is_set() {
            self.components.len() + 1
        } else {
            // no host and no components: a tag is still emitted so the
            // degenerate session is recorded
            self.components.len()
        };

        self.tags.push(XidTag {
            tag: self.join_tag(component_count, 0),
            row: self.radio_host.row,
        });

        for (position, component) in self.components.iter().enumerate() {
            self.tags.push(XidTag {
                tag: self.join_tag(component_count, position + 1),
                row: component.row,
            });
        }

        &self.tags
    }

    pub fn tags(&self) -> &[XidTag] {
        &self.tags
    }

    fn join_tag(&self, component_count: usize, component_index: usize) -> String {
        format!(
            "{radio}{sep}{infrared}{sep}m{component_count}{sep}C{component_index}",
            radio = self.radio_host.id,
            infrared = self.infrared_host.id,
            sep = TAG_SEPARATOR,
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
