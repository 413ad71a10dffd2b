// Error taxonomy for the playlist/queue core
// Lookups and queue operations report misses through these instead of panicking

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("{0} is empty")]
    EmptyContainer(&'static str),

    #[error("no playlist selected")]
    NoActivePlaylist,

    #[error("failed to play '{}': {reason}", path.display())]
    Playback { path: PathBuf, reason: String },
}

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
