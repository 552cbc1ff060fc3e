use std::io::{self, Write};

use crate::entity::{Note, NoteId};
use crate::sync::NoteView;

/// Prints render and removal events to stdout.
#[derive(Debug, Default)]
pub struct TerminalView {
    muted: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// A view that prints nothing until unmuted.
    pub fn muted() -> Self {
        Self { muted: true }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn emit(&self, line: String) {
        if self.muted {
            return;
        }
        // A closed stdout (e.g. piped into `head`) is not worth failing over.
        let _ = writeln!(io::stdout(), "{}", line);
    }
}

pub fn format_note(note: &Note, color: &str) -> String {
    format!(
        "[{}] {}  ({}x{}, {})",
        note.id,
        note.content.escape_debug(),
        note.width,
        note.height,
        color
    )
}

impl NoteView for TerminalView {
    fn render(&mut self, note: &Note, color: &str) {
        self.emit(format_note(note, color));
    }

    fn clear(&mut self) {}

    fn remove(&mut self, id: NoteId) {
        self.emit(format!("Removed note {}", id));
    }

    fn render_all(&mut self, notes: &[Note], color: &str) {
        if notes.is_empty() {
            self.emit("No notes.".to_string());
            return;
        }
        for note in notes {
            self.render(note, color);
        }
    }
}
