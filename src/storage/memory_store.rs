use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::KeyValueStore;
use crate::error::{Result, StickiesError};

#[derive(Debug)]
struct Inner {
    values: HashMap<String, String>,
    writes: usize,
    writes_by_key: HashMap<String, usize>,
    available: bool,
}

/// In-process key-value store.
///
/// Clones share the same map, so a host can keep a handle for inspection
/// after moving one into a repository.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                values: HashMap::new(),
                writes: 0,
                writes_by_key: HashMap::new(),
                available: true,
            })),
        }
    }

    /// Seed values without counting them as writes.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner
                .values
                .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StickiesError::unavailable("memory store lock poisoned"))
    }

    fn lock_available(&self) -> Result<MutexGuard<'_, Inner>> {
        let inner = self.lock()?;
        if !inner.available {
            return Err(StickiesError::unavailable("memory store is offline"));
        }
        Ok(inner)
    }

    /// Simulate the medium going away (or coming back).
    pub fn set_available(&self, available: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.available = available;
        }
    }

    /// Number of successful `set` calls since creation.
    pub fn write_count(&self) -> usize {
        self.inner.lock().map(|i| i.writes).unwrap_or(0)
    }

    pub fn write_count_for(&self, key: &str) -> usize {
        self.inner
            .lock()
            .map(|i| i.writes_by_key.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Read a value regardless of availability.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|i| i.values.get(key).cloned())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let inner = self.lock_available()?;
        Ok(inner.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock_available()?;
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        *inner.writes_by_key.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let mut inner = self.lock_available()?;
        inner.values.clear();
        Ok(())
    }
}
