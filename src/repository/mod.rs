//! In-memory note collection with write-through persistence.
//!
//! The repository owns the ordered notes, the id counter and the active
//! color. Each of the three is stored under its own key so that a corrupt
//! value in one never takes the others down with it.

use std::collections::HashSet;

use crate::config::{Config, StorageKeys};
use crate::entity::{Geometry, Note, NoteId, NotePatch, StoredNote};
use crate::error::{Result, StickiesError};
use crate::storage::KeyValueStore;

/// Outcome of [`NoteRepository::hydrate`].
#[derive(Debug, Default)]
pub struct HydrationReport {
    pub notes_loaded: usize,
    /// Notes that were missing geometry (or had unusable geometry).
    pub legacy_normalized: usize,
    /// Stored notes dropped because their id was already taken.
    pub duplicates_dropped: usize,
    /// Set when the stored counter was behind the highest note id.
    pub counter_raised_from: Option<NoteId>,
    /// Per-key recoveries, each a `MalformedPersistedData`.
    pub recovered: Vec<StickiesError>,
}

impl HydrationReport {
    pub fn is_clean(&self) -> bool {
        self.recovered.is_empty()
            && self.legacy_normalized == 0
            && self.duplicates_dropped == 0
            && self.counter_raised_from.is_none()
    }
}

pub struct NoteRepository<S> {
    store: S,
    keys: StorageKeys,
    default_color: String,
    default_geometry: Geometry,
    notes: Vec<Note>,
    id_counter: NoteId,
    active_color: String,
    persistence_suspended: bool,
}

impl<S: KeyValueStore> NoteRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &Config::default())
    }

    pub fn with_config(store: S, config: &Config) -> Self {
        Self {
            store,
            keys: config.keys.clone(),
            default_color: config.default_color.clone(),
            default_geometry: config.default_geometry(),
            notes: Vec::new(),
            id_counter: 0,
            active_color: config.default_color.clone(),
            persistence_suspended: false,
        }
    }

    // ========================================================================
    // Hydration
    // ========================================================================

    /// Load state from the store, replacing whatever is in memory.
    ///
    /// Malformed values fall back to their default independently of each
    /// other. If the store cannot be read at all the repository stays at
    /// defaults, persistence is suspended for the session, and
    /// `StoreUnavailable` is returned.
    pub fn hydrate(&mut self) -> Result<HydrationReport> {
        self.reset_memory();
        self.persistence_suspended = false;

        let raw = self.read_raw();
        let (raw_notes, raw_counter, raw_color) = match raw {
            Ok(values) => values,
            Err(e) => {
                self.persistence_suspended = true;
                tracing::error!(error = %e, "hydration failed; continuing in memory only");
                return Err(e);
            }
        };

        let mut report = HydrationReport::default();

        if let Some(raw) = raw_notes {
            match self.parse_notes(&raw, &mut report) {
                Ok(notes) => self.notes = notes,
                Err(reason) => report.recovered.push(self.malformed(&self.keys.notes, reason)),
            }
        }

        if let Some(raw) = raw_counter {
            match raw.trim().parse::<NoteId>() {
                Ok(counter) => self.id_counter = counter,
                Err(e) => report
                    .recovered
                    .push(self.malformed(&self.keys.id_counter, e.to_string())),
            }
        }

        if let Some(raw) = raw_color {
            let color = raw.trim();
            if color.is_empty() {
                report
                    .recovered
                    .push(self.malformed(&self.keys.color, "blank color".to_string()));
            } else {
                self.active_color = color.to_string();
            }
        }

        // Ids must never be reused, even if the counter was lost.
        if let Some(max_id) = self.notes.iter().map(|n| n.id).max() {
            if self.id_counter <= max_id {
                report.counter_raised_from = Some(self.id_counter);
                match max_id.checked_add(1) {
                    Some(next) => {
                        tracing::warn!(
                            stored = self.id_counter,
                            raised_to = next,
                            "id counter behind stored notes; raising it"
                        );
                        self.id_counter = next;
                    }
                    None => {
                        report.recovered.push(self.malformed(
                            &self.keys.id_counter,
                            format!("stored note id {} leaves no id to assign", max_id),
                        ));
                        self.id_counter = NoteId::MAX;
                    }
                }
            }
        }

        report.notes_loaded = self.notes.len();
        for err in &report.recovered {
            tracing::warn!(error = %err, "recovered from malformed persisted data");
        }
        tracing::debug!(
            notes = report.notes_loaded,
            id_counter = self.id_counter,
            color = %self.active_color,
            "hydrated repository"
        );
        Ok(report)
    }

    fn read_raw(&self) -> Result<(Option<String>, Option<String>, Option<String>)> {
        let notes = self.store.get(&self.keys.notes)?;
        let counter = self.store.get(&self.keys.id_counter)?;
        let color = self.store.get(&self.keys.color)?;
        Ok((notes, counter, color))
    }

    fn parse_notes(
        &self,
        raw: &str,
        report: &mut HydrationReport,
    ) -> std::result::Result<Vec<Note>, String> {
        let stored: Vec<StoredNote> = serde_json::from_str(raw).map_err(|e| e.to_string())?;

        let mut seen = HashSet::with_capacity(stored.len());
        let mut notes = Vec::with_capacity(stored.len());
        for entry in stored {
            if !seen.insert(entry.id) {
                tracing::warn!(id = entry.id, "dropping stored note with duplicate id");
                report.duplicates_dropped += 1;
                continue;
            }
            if entry.is_legacy() {
                report.legacy_normalized += 1;
            }
            notes.push(entry.normalize(self.default_geometry));
        }
        Ok(notes)
    }

    fn malformed(&self, key: &str, reason: String) -> StickiesError {
        StickiesError::MalformedPersistedData {
            key: key.to_string(),
            reason,
        }
    }

    fn reset_memory(&mut self) {
        self.notes.clear();
        self.id_counter = 0;
        self.active_color = self.default_color.clone();
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a note with the next id and default content and geometry.
    pub fn add_note(&mut self) -> Result<Note> {
        let id = self.id_counter;
        let next = id.checked_add(1).ok_or(StickiesError::IdsExhausted)?;
        let note = Note::new(id, self.default_geometry);

        self.id_counter = next;
        self.notes.push(note.clone());

        let counter = self.persist_counter();
        let notes = self.persist_notes();
        counter.and(notes)?;

        tracing::debug!(id, "added note");
        Ok(note)
    }

    /// Apply `patch` to note `id`, writing only if something changed.
    ///
    /// Returns whether the note changed. An unknown id is a caller bug and
    /// yields `NoteNotFound`.
    pub fn update_note(&mut self, id: NoteId, patch: NotePatch) -> Result<bool> {
        self.check_patch(id, &patch)?;
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StickiesError::NoteNotFound(id))?;

        if !patch.differs_from(note) {
            tracing::trace!(id, "update is a no-op; skipping write");
            return Ok(false);
        }

        patch.apply_to(note);
        self.persist_notes()?;
        Ok(true)
    }

    /// Fail the way [`NoteRepository::update_note`] would, without applying.
    pub fn check_patch(&self, id: NoteId, patch: &NotePatch) -> Result<()> {
        let note = self.get_note(id).ok_or(StickiesError::NoteNotFound(id))?;

        let width = patch.width.unwrap_or(note.width);
        let height = patch.height.unwrap_or(note.height);
        if !Geometry::new(width, height).is_valid() {
            return Err(StickiesError::InvalidGeometry { width, height });
        }
        Ok(())
    }

    /// Remove note `id` if present. Removing an absent id is a no-op.
    pub fn remove_note(&mut self, id: NoteId) -> Result<bool> {
        let Some(pos) = self.notes.iter().position(|n| n.id == id) else {
            tracing::debug!(id, "remove of absent note ignored");
            return Ok(false);
        };

        self.notes.remove(pos);
        self.persist_notes()?;
        Ok(true)
    }

    /// Set the color applied to every note at render time.
    ///
    /// Blank input is rejected and returns `false`. The value is trimmed.
    pub fn set_active_color(&mut self, color: &str) -> Result<bool> {
        let color = color.trim();
        if color.is_empty() {
            tracing::debug!("blank color rejected");
            return Ok(false);
        }
        if color == self.active_color {
            return Ok(true);
        }

        self.active_color = color.to_string();
        self.persist_color()?;
        Ok(true)
    }

    /// Write all three keys.
    pub fn flush(&mut self) -> Result<()> {
        let counter = self.persist_counter();
        let notes = self.persist_notes();
        let color = self.persist_color();
        counter.and(notes).and(color)
    }

    /// Clear the store and return to defaults.
    pub fn reset(&mut self) -> Result<()> {
        self.reset_memory();
        if self.persistence_suspended {
            return Ok(());
        }
        self.store.clear()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.persistence_suspended {
            tracing::trace!(key, "persistence suspended; keeping change in memory");
            return Ok(());
        }
        self.store.set(key, value)
    }

    fn persist_notes(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.notes)?;
        let key = self.keys.notes.clone();
        self.write(&key, &json)
    }

    fn persist_counter(&mut self) -> Result<()> {
        let value = self.id_counter.to_string();
        let key = self.keys.id_counter.clone();
        self.write(&key, &value)
    }

    fn persist_color(&mut self) -> Result<()> {
        let value = self.active_color.clone();
        let key = self.keys.color.clone();
        self.write(&key, &value)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Notes in insertion order.
    pub fn list_notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get_note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn id_counter(&self) -> NoteId {
        self.id_counter
    }

    pub fn active_color(&self) -> &str {
        &self.active_color
    }

    pub fn is_persistence_suspended(&self) -> bool {
        self.persistence_suspended
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
