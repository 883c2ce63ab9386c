//! XMATCH Storage - Table Persistence and Session Recovery
//!
//! The fixed-width two-line table format used for catalogues and the
//! working table, numbered pre-write backups, and the resume merge that
//! lets an interrupted run pick up where it left off.

pub mod backup;
pub mod error;
pub mod paths;
pub mod recovery;
pub mod table;

pub use backup::backup_versioned;
pub use error::{StorageError, StorageResult};
pub use paths::{ensure_folder, file_accessible};
pub use recovery::resume_session;
pub use table::{
    read_catalogue, read_raw_table, save_radio_table, write_raw_table, ColumnBindings, RawTable,
    SaveOutcome, COMMENT_COLUMN, FLAG_COLUMN, TAG_COLUMN,
};
