mod memory_store;
mod sqlite_store;

pub use memory_store::MemoryStore;
pub use sqlite_store::{SqliteStore, NOTES_DB, STICKIES_DIR};

use crate::error::Result;

/// Narrow string-keyed, string-valued durable store.
///
/// Implementations report an unreachable medium as
/// [`StoreUnavailable`](crate::StickiesError::StoreUnavailable); a write that
/// returns `Ok` has reached the medium.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove every key.
    fn clear(&mut self) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}
