pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod repository;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use entity::{Note, NoteId, NotePatch};
pub use error::{Result, StickiesError};
pub use repository::{HydrationReport, NoteRepository};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use sync::{Controller, Intent};
