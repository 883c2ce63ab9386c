//! Error types for the operator interface.

use crate::config::ConfigError;
use crate::cutout::RenderError;

#[derive(Debug, thiserror::Error)]
pub enum TuiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] xmatch_storage::StorageError),
    #[error(transparent)]
    Core(#[from] xmatch_core::CoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
