use crate::entity::NoteId;

/// How urgently a view-originated change must reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Blur, confirm key, pointer release: write now.
    Immediate,
    /// Typing or live resizing: coalesce.
    Live,
}

/// Role of the widget a key press originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputOrigin {
    TextEditor,
    ColorInput,
    #[default]
    Other,
}

impl InputOrigin {
    /// Shortcuts never fire while the user is typing into a widget.
    pub fn accepts_shortcuts(self) -> bool {
        matches!(self, InputOrigin::Other)
    }
}

impl std::fmt::Display for InputOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputOrigin::TextEditor => write!(f, "text-editor"),
            InputOrigin::ColorInput => write!(f, "color-input"),
            InputOrigin::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for InputOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "text-editor" | "texteditor" | "textarea" => Ok(InputOrigin::TextEditor),
            "color-input" | "colorinput" => Ok(InputOrigin::ColorInput),
            "other" | "none" => Ok(InputOrigin::Other),
            _ => Err(format!("Invalid input origin: {}", s)),
        }
    }
}

/// A mutation request coming from the view layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    AddRequested,
    /// Full snapshot of a note widget.
    NoteChanged {
        id: NoteId,
        content: String,
        width: f64,
        height: f64,
        commit: CommitMode,
    },
    ContentChanged {
        id: NoteId,
        content: String,
        commit: CommitMode,
    },
    GeometryChanged {
        id: NoteId,
        width: f64,
        height: f64,
        commit: CommitMode,
    },
    DeleteRequested {
        id: NoteId,
    },
    /// Raw value submitted from the color form.
    ColorChanged {
        color: String,
    },
    ShortcutPressed {
        key: char,
        origin: InputOrigin,
    },
}
