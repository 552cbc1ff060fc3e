use thiserror::Error;

use crate::entity::NoteId;

#[derive(Error, Debug)]
pub enum StickiesError {
    #[error("Not in a stickies project. Run 'stickies init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .stickies/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    #[error("Invalid geometry: {width}x{height} (both sides must be positive)")]
    InvalidGeometry { width: f64, height: f64 },

    #[error("No note ids left: the id counter is at its maximum")]
    IdsExhausted,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Malformed persisted data under '{key}': {reason}")]
    MalformedPersistedData { key: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl StickiesError {
    /// Wrap any backend failure as a [`StickiesError::StoreUnavailable`].
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        StickiesError::StoreUnavailable(err.to_string())
    }

    /// True for failures of the durable medium, which callers may degrade past.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, StickiesError::StoreUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, StickiesError>;
