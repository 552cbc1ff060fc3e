use serde::{Deserialize, Serialize};

use super::{Geometry, NoteId};

/// A single sticky note as it is persisted and rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub width: f64,
    pub height: f64,
}

impl Note {
    /// Build a fresh note with the default `"Note {id}"` content.
    pub fn new(id: NoteId, geometry: Geometry) -> Self {
        Self {
            id,
            content: format!("Note {}", id),
            width: geometry.width,
            height: geometry.height,
        }
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            width: self.width,
            height: self.height,
        }
    }
}

/// Persisted shape accepted on hydration.
///
/// Notes written before geometry tracking carry only `id` and `content`, so
/// both sides are optional here and filled in by [`StoredNote::normalize`].
#[derive(Debug, Clone, Deserialize)]
pub struct StoredNote {
    pub id: NoteId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl StoredNote {
    /// Fill missing or unusable geometry from `fallback`.
    pub fn normalize(self, fallback: Geometry) -> Note {
        let width = self.width.filter(|w| Geometry::valid_side(*w));
        let height = self.height.filter(|h| Geometry::valid_side(*h));
        Note {
            id: self.id,
            content: self.content,
            width: width.unwrap_or(fallback.width),
            height: height.unwrap_or(fallback.height),
        }
    }

    /// Whether normalization would have to replace any field.
    pub fn is_legacy(&self) -> bool {
        !matches!(self.width, Some(w) if Geometry::valid_side(w))
            || !matches!(self.height, Some(h) if Geometry::valid_side(h))
    }
}

/// Partial update of a note. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub content: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl NotePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn geometry(width: f64, height: f64) -> Self {
        Self {
            content: None,
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.width.is_none() && self.height.is_none()
    }

    /// Layer `newer` on top of `self`; fields set in `newer` win.
    pub fn overlay(self, newer: NotePatch) -> NotePatch {
        NotePatch {
            content: newer.content.or(self.content),
            width: newer.width.or(self.width),
            height: newer.height.or(self.height),
        }
    }

    /// True if applying this patch to `note` would change anything.
    pub fn differs_from(&self, note: &Note) -> bool {
        self.content.as_ref().is_some_and(|c| *c != note.content)
            || self.width.is_some_and(|w| w != note.width)
            || self.height.is_some_and(|h| h != note.height)
    }

    pub(crate) fn apply_to(self, note: &mut Note) {
        if let Some(content) = self.content {
            note.content = content;
        }
        if let Some(width) = self.width {
            note.width = width;
        }
        if let Some(height) = self.height {
            note.height = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_note_defaults() {
        let note = Note::new(3, Geometry::default());
        assert_eq!(note.content, "Note 3");
        assert_eq!(note.width, 120.0);
        assert_eq!(note.height, 120.0);
    }

    #[test]
    fn test_legacy_note_gets_default_geometry() {
        let stored: StoredNote = serde_json::from_str(r#"{"id":4,"content":"old"}"#).unwrap();
        assert!(stored.is_legacy());

        let note = stored.normalize(Geometry::default());
        assert_eq!(note.id, 4);
        assert_eq!(note.content, "old");
        assert_eq!(note.geometry(), Geometry::default());
    }

    #[test]
    fn test_non_positive_geometry_is_normalized() {
        let stored: StoredNote =
            serde_json::from_str(r#"{"id":1,"content":"x","width":-5,"height":80}"#).unwrap();
        let note = stored.normalize(Geometry::default());
        assert_eq!(note.width, 120.0);
        assert_eq!(note.height, 80.0);
    }

    #[test]
    fn test_patch_overlay_prefers_newer_fields() {
        let older = NotePatch::content("draft");
        let newer = NotePatch::geometry(200.0, 150.0);
        let merged = older.overlay(newer);

        assert_eq!(merged.content.as_deref(), Some("draft"));
        assert_eq!(merged.width, Some(200.0));
        assert_eq!(merged.height, Some(150.0));

        let merged = merged.overlay(NotePatch::content("final"));
        assert_eq!(merged.content.as_deref(), Some("final"));
    }

    #[test]
    fn test_patch_differs_from() {
        let note = Note::new(0, Geometry::default());
        assert!(!NotePatch::content("Note 0").differs_from(&note));
        assert!(!NotePatch::geometry(120.0, 120.0).differs_from(&note));
        assert!(NotePatch::content("changed").differs_from(&note));
        assert!(NotePatch::geometry(120.0, 121.0).differs_from(&note));
        assert!(!NotePatch::default().differs_from(&note));
    }

    #[test]
    fn test_serialized_shape() {
        let note = Note::new(0, Geometry::default());
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["id"], 0);
        assert_eq!(value["content"], "Note 0");
        assert_eq!(value["width"], 120.0);
        assert_eq!(value["height"], 120.0);
    }
}
