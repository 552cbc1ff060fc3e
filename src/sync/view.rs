use crate::entity::{Note, NoteId};

/// Output side of the controller: whatever draws note widgets.
pub trait NoteView {
    /// Draw (or redraw in place) a single note.
    fn render(&mut self, note: &Note, color: &str);

    /// Drop every widget.
    fn clear(&mut self);

    /// Drop the widget for `id`, if any.
    fn remove(&mut self, id: NoteId);

    /// Full re-render in collection order.
    fn render_all(&mut self, notes: &[Note], color: &str) {
        self.clear();
        for note in notes {
            self.render(note, color);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Cleared,
    Rendered { note: Note, color: String },
    Removed(NoteId),
}

/// A note as currently shown.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub note: Note,
    pub color: String,
}

/// View that records every call and models the resulting screen.
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Vec<ViewEvent>,
    widgets: Vec<Widget>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ViewEvent] {
        &self.events
    }

    /// Widgets currently on screen, in render order.
    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn widget(&self, id: NoteId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.note.id == id)
    }

    pub fn full_renders(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ViewEvent::Cleared))
            .count()
    }

    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }
}

impl NoteView for RecordingView {
    fn render(&mut self, note: &Note, color: &str) {
        self.events.push(ViewEvent::Rendered {
            note: note.clone(),
            color: color.to_string(),
        });
        let widget = Widget {
            note: note.clone(),
            color: color.to_string(),
        };
        match self.widgets.iter_mut().find(|w| w.note.id == note.id) {
            Some(existing) => *existing = widget,
            None => self.widgets.push(widget),
        }
    }

    fn clear(&mut self) {
        self.events.push(ViewEvent::Cleared);
        self.widgets.clear();
    }

    fn remove(&mut self, id: NoteId) {
        self.events.push(ViewEvent::Removed(id));
        self.widgets.retain(|w| w.note.id != id);
    }
}
