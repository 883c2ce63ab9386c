//! XMATCH Core - Identification Session State Machine
//!
//! The per-source identification session: the `Identity` selections and
//! XID tag derivation, the three-phase selection protocol, and the target
//! sequencer. Pure domain logic with no I/O; persistence lives in
//! `xmatch-storage` and the operator surface in `xmatch-tui`.

pub mod catalogue;
pub mod error;
pub mod identity;
pub mod sequencer;
pub mod session;

pub use catalogue::{
    angular_separation_arcsec, Catalogue, CatalogueRow, RadioRow, RadioTable, TagStatus,
    XidColumns, COMMENT_LIMIT, COMMENT_PLACEHOLDER, INFRARED_HOST_SENTINEL, NEIGHBOURHOOD_ARCSEC,
    RADIO_HOST_SENTINEL, SKIPPED_PLACEHOLDER, TAG_PLACEHOLDER, TAG_WIDTH,
};
pub use error::{CoreError, CoreResult};
pub use identity::{HostRef, Identity, Selection, XidTag, TAG_SEPARATOR};
pub use sequencer::{RunMode, SequencerStep, TargetSequencer, AUTOSAVE_EVERY};
pub use session::{
    ActiveCatalogue, Effect, Phase, Session, SessionEvent, DEFAULT_CONFIDENCE, MAX_CONFIDENCE,
    ZOOM_FACTOR,
};
