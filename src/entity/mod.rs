mod note;

pub use note::{Note, NotePatch, StoredNote};

/// Identifier assigned to a note by the repository's id counter.
pub type NoteId = u64;

pub const DEFAULT_WIDTH: f64 = 120.0;
pub const DEFAULT_HEIGHT: f64 = 120.0;

/// On-screen size of a note in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl Geometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn valid_side(side: f64) -> bool {
        side.is_finite() && side > 0.0
    }

    pub fn is_valid(&self) -> bool {
        Self::valid_side(self.width) && Self::valid_side(self.height)
    }
}
