//! Keyed debounce for high-frequency writes.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct Pending<T> {
    deadline: Instant,
    seq: u64,
    value: T,
}

/// Collapses repeated requests for the same key into one, fired once the
/// key has been quiet for `window`.
///
/// Time is passed in explicitly; the owner decides when to call
/// [`Coalescer::take_due`] (see [`crate::sync::driver`]).
#[derive(Debug)]
pub struct Coalescer<K, T> {
    window: Duration,
    pending: HashMap<K, Pending<T>>,
    next_seq: u64,
}

impl<K: Eq + Hash + Clone, T> Coalescer<K, T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Register `value` for `key`, restarting the key's quiet window.
    ///
    /// Returns the superseded value, if one was pending.
    pub fn schedule(&mut self, key: K, value: T, now: Instant) -> Option<T> {
        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = Pending {
            deadline: now + self.window,
            seq,
            value,
        };
        self.pending.insert(key, entry).map(|old| old.value)
    }

    /// Remove and return every entry whose window has elapsed, oldest
    /// deadline first.
    pub fn take_due(&mut self, now: Instant) -> Vec<(K, T)> {
        let due_keys: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(k, _)| k.clone())
            .collect();

        let mut due: Vec<(K, Pending<T>)> = due_keys
            .into_iter()
            .filter_map(|k| self.pending.remove(&k).map(|p| (k, p)))
            .collect();
        due.sort_by_key(|(_, p)| (p.deadline, p.seq));
        due.into_iter().map(|(k, p)| (k, p.value)).collect()
    }

    /// Claim the pending value for `key` so it never fires.
    ///
    /// Used when an immediate write for the same key supersedes it.
    pub fn take(&mut self, key: &K) -> Option<T> {
        self.pending.remove(key).map(|p| p.value)
    }

    pub fn pending(&self, key: &K) -> Option<&T> {
        self.pending.get(key).map(|p| &p.value)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
