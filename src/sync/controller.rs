//! Applies view intents to the repository and decides when to persist and
//! when to redraw.

use tokio::time::Instant;

use super::coalescer::Coalescer;
use super::intent::{CommitMode, InputOrigin, Intent};
use super::view::NoteView;
use crate::config::Config;
use crate::entity::{NoteId, NotePatch};
use crate::error::{Result, StickiesError};
use crate::repository::{HydrationReport, NoteRepository};
use crate::storage::KeyValueStore;

/// Outcome of [`Controller::flush_due`].
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Writes that changed a note.
    pub applied: usize,
    pub rejected: Vec<(NoteId, StickiesError)>,
}

pub struct Controller<S, V> {
    repo: NoteRepository<S>,
    view: V,
    coalescer: Coalescer<NoteId, NotePatch>,
    quick_add_key: char,
    degraded: bool,
}

impl<S: KeyValueStore, V: NoteView> Controller<S, V> {
    pub fn new(repo: NoteRepository<S>, view: V, config: &Config) -> Self {
        Self {
            repo,
            view,
            coalescer: Coalescer::new(config.quiet_window()),
            quick_add_key: config.quick_add_key,
            degraded: false,
        }
    }

    /// Hydrate from the store and draw every note once.
    ///
    /// An unreadable store still renders (an empty board) before the error
    /// is returned; the controller keeps working in memory.
    pub fn startup(&mut self) -> Result<HydrationReport> {
        let hydrated = self.repo.hydrate();
        if hydrated.is_err() {
            self.degraded = true;
        }
        self.render_all();
        hydrated
    }

    pub fn handle(&mut self, intent: Intent) -> Result<()> {
        self.handle_at(intent, Instant::now())
    }

    /// Like [`Controller::handle`] with an explicit clock reading.
    pub fn handle_at(&mut self, intent: Intent, now: Instant) -> Result<()> {
        match intent {
            Intent::AddRequested => self.add(),
            Intent::NoteChanged {
                id,
                content,
                width,
                height,
                commit,
            } => {
                let patch = NotePatch {
                    content: Some(content),
                    width: Some(width),
                    height: Some(height),
                };
                self.change(id, patch, commit, now)
            }
            Intent::ContentChanged {
                id,
                content,
                commit,
            } => self.change(id, NotePatch::content(content), commit, now),
            Intent::GeometryChanged {
                id,
                width,
                height,
                commit,
            } => self.change(id, NotePatch::geometry(width, height), commit, now),
            Intent::DeleteRequested { id } => self.delete(id),
            Intent::ColorChanged { color } => self.change_color(&color),
            Intent::ShortcutPressed { key, origin } => self.shortcut(key, origin),
        }
    }

    /// Run every coalesced write whose quiet window has elapsed.
    ///
    /// A rejected write does not stop the rest of the batch.
    pub fn flush_due(&mut self, now: Instant) -> FlushReport {
        let mut report = FlushReport::default();
        for (id, patch) in self.coalescer.take_due(now) {
            tracing::debug!(id, "flushing coalesced change");
            match self.apply_patch(id, patch) {
                Ok(true) => report.applied += 1,
                Ok(false) => {}
                Err(e) => report.rejected.push((id, e)),
            }
        }
        report
    }

    /// Rewrite all persisted keys, clearing the degraded flag on success.
    pub fn flush(&mut self) -> Result<()> {
        self.repo.flush()?;
        self.degraded = self.repo.is_persistence_suspended();
        Ok(())
    }

    fn add(&mut self) -> Result<()> {
        let result = self.repo.add_note();
        if let Some(note) = self.absorb(result)? {
            tracing::info!(id = note.id, "note created");
        }
        self.render_all();
        Ok(())
    }

    fn change(&mut self, id: NoteId, patch: NotePatch, commit: CommitMode, now: Instant) -> Result<()> {
        let patch = match self.coalescer.pending(&id) {
            Some(pending) => pending.clone().overlay(patch),
            None => patch,
        };
        // Rejected changes leave any pending live change in place.
        self.repo.check_patch(id, &patch)?;

        match commit {
            CommitMode::Immediate => {
                self.coalescer.take(&id);
                self.apply_patch(id, patch)?;
            }
            CommitMode::Live => {
                self.coalescer.schedule(id, patch, now);
            }
        }
        Ok(())
    }

    fn apply_patch(&mut self, id: NoteId, patch: NotePatch) -> Result<bool> {
        let result = self.repo.update_note(id, patch);
        // A failed write still changed the note in memory.
        Ok(self.absorb(result)?.unwrap_or(true))
    }

    fn delete(&mut self, id: NoteId) -> Result<()> {
        if self.coalescer.take(&id).is_some() {
            tracing::debug!(id, "discarding pending change for deleted note");
        }

        let result = self.repo.remove_note(id);
        // An Err here means the note existed and was removed from memory.
        let removed = self.absorb(result)?.unwrap_or(true);
        if removed {
            tracing::info!(id, "note deleted");
            self.view.remove(id);
        }
        Ok(())
    }

    fn change_color(&mut self, color: &str) -> Result<()> {
        let result = self.repo.set_active_color(color);
        match self.absorb(result)? {
            Some(false) => {
                tracing::debug!("ignoring blank color submission");
            }
            _ => self.render_all(),
        }
        Ok(())
    }

    fn shortcut(&mut self, key: char, origin: InputOrigin) -> Result<()> {
        if !origin.accepts_shortcuts() {
            tracing::trace!(%key, %origin, "shortcut suppressed inside input widget");
            return Ok(());
        }
        if key.eq_ignore_ascii_case(&self.quick_add_key) {
            return self.add();
        }
        Ok(())
    }

    fn render_all(&mut self) {
        self.view
            .render_all(self.repo.list_notes(), self.repo.active_color());
    }

    /// Downgrade store failures to a logged, in-memory-only outcome.
    fn absorb<T>(&mut self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_store_unavailable() => {
                tracing::warn!(error = %e, "persist failed; change kept in memory");
                self.degraded = true;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.coalescer.next_deadline()
    }

    pub fn pending_writes(&self) -> usize {
        self.coalescer.len()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded || self.repo.is_persistence_suspended()
    }

    pub fn repository(&self) -> &NoteRepository<S> {
        &self.repo
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_parts(self) -> (NoteRepository<S>, V) {
        (self.repo, self.view)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::entity::Geometry;
    use crate::storage::MemoryStore;
    use crate::sync::view::{RecordingView, ViewEvent};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn controller(store: &MemoryStore) -> Controller<MemoryStore, RecordingView> {
        let config = Config::default();
        let repo = NoteRepository::with_config(store.clone(), &config);
        let mut controller = Controller::new(repo, RecordingView::new(), &config);
        controller.startup().unwrap();
        controller
    }

    fn live(id: NoteId, content: &str) -> Intent {
        Intent::ContentChanged {
            id,
            content: content.to_string(),
            commit: CommitMode::Live,
        }
    }

    fn commit(id: NoteId, content: &str) -> Intent {
        Intent::ContentChanged {
            id,
            content: content.to_string(),
            commit: CommitMode::Immediate,
        }
    }

    #[test]
    fn test_startup_renders_every_note_once() {
        let store = MemoryStore::new();
        {
            let mut c = controller(&store);
            c.handle(Intent::AddRequested).unwrap();
            c.handle(Intent::AddRequested).unwrap();
        }

        let c = controller(&store);
        let events = c.view().events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ViewEvent::Cleared);
        let ids: Vec<NoteId> = c.view().widgets().iter().map(|w| w.note.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_add_rerenders_everything() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();
        c.handle(Intent::AddRequested).unwrap();

        assert_eq!(c.view().full_renders(), 3);
        let widget = c.view().widget(0).unwrap();
        assert_eq!(widget.note.content, "Note 0");
        assert_eq!(widget.note.geometry(), Geometry::default());
        assert_eq!(widget.color, "#ffc");
    }

    #[test]
    fn test_three_live_changes_make_one_write_with_last_content() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();
        let base = store.write_count();

        let t0 = Instant::now();
        c.handle_at(live(0, "a"), t0).unwrap();
        c.handle_at(live(0, "ab"), t0 + ms(100)).unwrap();
        c.handle_at(live(0, "abc"), t0 + ms(200)).unwrap();
        assert_eq!(c.pending_writes(), 1);

        assert_eq!(c.flush_due(t0 + ms(499)).applied, 0);
        assert_eq!(store.write_count(), base);

        assert_eq!(c.flush_due(t0 + ms(500)).applied, 1);
        assert_eq!(store.write_count(), base + 1);
        assert_eq!(c.repository().get_note(0).unwrap().content, "abc");
        assert!(store.peek("notes-content").unwrap().contains("\"abc\""));
    }

    #[test]
    fn test_live_changes_to_different_notes_do_not_cancel() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();
        c.handle(Intent::AddRequested).unwrap();

        let t0 = Instant::now();
        c.handle_at(live(0, "zero"), t0).unwrap();
        c.handle_at(live(1, "one"), t0 + ms(50)).unwrap();
        c.flush_due(t0 + ms(400));

        let repo = c.repository();
        assert_eq!(repo.get_note(0).unwrap().content, "zero");
        assert_eq!(repo.get_note(1).unwrap().content, "one");
    }

    #[test]
    fn test_live_content_and_geometry_merge() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();

        let t0 = Instant::now();
        c.handle_at(live(0, "typed"), t0).unwrap();
        c.handle_at(
            Intent::GeometryChanged {
                id: 0,
                width: 250.0,
                height: 90.0,
                commit: CommitMode::Live,
            },
            t0 + ms(10),
        )
        .unwrap();
        c.flush_due(t0 + ms(310));

        let note = c.repository().get_note(0).unwrap();
        assert_eq!(note.content, "typed");
        assert_eq!(note.geometry(), Geometry::new(250.0, 90.0));
    }

    #[test]
    fn test_immediate_commit_supersedes_pending_live_change() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();
        let base = store.write_count();

        let t0 = Instant::now();
        c.handle_at(live(0, "draft"), t0).unwrap();
        c.handle_at(commit(0, "final"), t0 + ms(50)).unwrap();
        assert_eq!(store.write_count(), base + 1);
        assert_eq!(c.pending_writes(), 0);

        c.flush_due(t0 + ms(1_000));
        assert_eq!(store.write_count(), base + 1);
        assert_eq!(c.repository().get_note(0).unwrap().content, "final");
    }

    #[test]
    fn test_invalid_live_geometry_is_rejected_before_scheduling() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();

        let t0 = Instant::now();
        c.handle_at(live(0, "typed"), t0).unwrap();
        let result = c.handle_at(
            Intent::GeometryChanged {
                id: 0,
                width: -1.0,
                height: 10.0,
                commit: CommitMode::Live,
            },
            t0 + ms(10),
        );
        assert!(matches!(result, Err(StickiesError::InvalidGeometry { .. })));

        // The earlier typing keeps its original window.
        assert_eq!(c.pending_writes(), 1);
        assert_eq!(c.next_deadline(), Some(t0 + ms(300)));
        let report = c.flush_due(t0 + ms(300));
        assert_eq!(report.applied, 1);
        assert!(report.rejected.is_empty());

        let note = c.repository().get_note(0).unwrap();
        assert_eq!(note.content, "typed");
        assert_eq!(note.geometry(), Geometry::default());
    }

    #[test]
    fn test_rejected_commit_keeps_pending_live_change() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();

        let t0 = Instant::now();
        c.handle_at(live(0, "typed"), t0).unwrap();
        let result = c.handle_at(
            Intent::GeometryChanged {
                id: 0,
                width: 0.0,
                height: 10.0,
                commit: CommitMode::Immediate,
            },
            t0 + ms(50),
        );
        assert!(matches!(result, Err(StickiesError::InvalidGeometry { .. })));
        assert_eq!(c.pending_writes(), 1);

        c.flush_due(t0 + ms(300));
        assert_eq!(c.repository().get_note(0).unwrap().content, "typed");
        assert!(store.peek("notes-content").unwrap().contains("\"typed\""));
    }

    #[test]
    fn test_one_rejected_flush_does_not_drop_the_batch() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();
        c.handle(Intent::AddRequested).unwrap();

        let t0 = Instant::now();
        c.handle_at(live(0, "gone"), t0).unwrap();
        c.handle_at(live(1, "keep me"), t0 + ms(10)).unwrap();
        // Remove note 0 behind the coalescer's back.
        c.repo.remove_note(0).unwrap();

        let report = c.flush_due(t0 + ms(1_000));
        assert_eq!(report.applied, 1);
        assert_eq!(report.rejected.len(), 1);
        assert!(matches!(report.rejected[0], (0, StickiesError::NoteNotFound(0))));
        assert_eq!(c.pending_writes(), 0);
        assert_eq!(c.repository().get_note(1).unwrap().content, "keep me");
        assert!(store.peek("notes-content").unwrap().contains("\"keep me\""));
    }

    #[test]
    fn test_unchanged_commit_does_not_write() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();
        let base = store.write_count();

        c.handle(Intent::NoteChanged {
            id: 0,
            content: "Note 0".to_string(),
            width: 120.0,
            height: 120.0,
            commit: CommitMode::Immediate,
        })
        .unwrap();
        assert_eq!(store.write_count(), base);
    }

    #[test]
    fn test_delete_is_targeted_and_discards_pending_change() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();
        c.handle(Intent::AddRequested).unwrap();
        let renders = c.view().full_renders();

        let t0 = Instant::now();
        c.handle_at(live(0, "doomed"), t0).unwrap();
        c.handle_at(Intent::DeleteRequested { id: 0 }, t0 + ms(10))
            .unwrap();

        assert_eq!(c.view().full_renders(), renders);
        assert_eq!(c.view().events().last(), Some(&ViewEvent::Removed(0)));
        assert_eq!(c.view().widgets().len(), 1);

        // The pending change must not resurrect or touch the deleted note.
        assert_eq!(c.flush_due(t0 + ms(1_000)).applied, 0);
        let ids: Vec<NoteId> = c.repository().list_notes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_double_delete_is_harmless() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();
        c.handle(Intent::DeleteRequested { id: 0 }).unwrap();
        let writes = store.write_count();
        let events = c.view().events().len();

        c.handle(Intent::DeleteRequested { id: 0 }).unwrap();
        assert_eq!(store.write_count(), writes);
        assert_eq!(c.view().events().len(), events);
        assert!(c.repository().list_notes().is_empty());
    }

    #[test]
    fn test_color_applies_to_existing_and_new_notes() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        c.handle(Intent::AddRequested).unwrap();

        c.handle(Intent::ColorChanged {
            color: "blue".to_string(),
        })
        .unwrap();
        assert_eq!(c.view().widget(0).unwrap().color, "blue");

        c.handle(Intent::AddRequested).unwrap();
        assert_eq!(c.view().widget(1).unwrap().color, "blue");

        // And after a reload.
        let reloaded = controller(&store);
        assert!(reloaded.view().widgets().iter().all(|w| w.color == "blue"));
    }

    #[test]
    fn test_blank_color_is_ignored() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        let renders = c.view().full_renders();

        c.handle(Intent::ColorChanged {
            color: "   ".to_string(),
        })
        .unwrap();
        assert_eq!(c.view().full_renders(), renders);
        assert_eq!(c.repository().active_color(), "#ffc");
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_shortcut_filtered_by_origin() {
        let store = MemoryStore::new();
        let mut c = controller(&store);

        for origin in [InputOrigin::TextEditor, InputOrigin::ColorInput] {
            c.handle(Intent::ShortcutPressed { key: 'n', origin }).unwrap();
        }
        assert!(c.repository().list_notes().is_empty());

        c.handle(Intent::ShortcutPressed {
            key: 'x',
            origin: InputOrigin::Other,
        })
        .unwrap();
        assert!(c.repository().list_notes().is_empty());

        c.handle(Intent::ShortcutPressed {
            key: 'n',
            origin: InputOrigin::Other,
        })
        .unwrap();
        c.handle(Intent::ShortcutPressed {
            key: 'N',
            origin: InputOrigin::Other,
        })
        .unwrap();
        assert_eq!(c.repository().list_notes().len(), 2);
    }

    #[test]
    fn test_stale_id_fails_loudly() {
        let store = MemoryStore::new();
        let mut c = controller(&store);

        let result = c.handle(commit(9, "x"));
        assert!(matches!(result, Err(StickiesError::NoteNotFound(9))));
        let result = c.handle(live(9, "x"));
        assert!(matches!(result, Err(StickiesError::NoteNotFound(9))));
        assert_eq!(c.pending_writes(), 0);
    }

    #[test]
    fn test_store_failure_degrades_but_keeps_editing() {
        let store = MemoryStore::new();
        let mut c = controller(&store);
        store.set_available(false);

        c.handle(Intent::AddRequested).unwrap();
        c.handle(commit(0, "offline edit")).unwrap();
        assert!(c.is_degraded());
        assert_eq!(c.view().widget(0).unwrap().note.id, 0);
        assert_eq!(
            c.repository().get_note(0).unwrap().content,
            "offline edit"
        );

        store.set_available(true);
        c.flush().unwrap();
        assert!(!c.is_degraded());
        let reloaded = controller(&store);
        assert_eq!(
            reloaded.repository().get_note(0).unwrap().content,
            "offline edit"
        );
    }

    #[test]
    fn test_unreadable_store_at_startup() {
        let store = MemoryStore::new();
        store.set_available(false);
        let config = Config::default();
        let repo = NoteRepository::with_config(store.clone(), &config);
        let mut c = Controller::new(repo, RecordingView::new(), &config);

        assert!(c.startup().unwrap_err().is_store_unavailable());
        assert!(c.is_degraded());
        assert_eq!(c.view().full_renders(), 1);

        c.handle(Intent::AddRequested).unwrap();
        assert_eq!(c.view().widgets().len(), 1);
    }
}
