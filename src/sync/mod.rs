//! View-facing synchronization: intents in, repository writes and render
//! calls out.

pub mod coalescer;
pub mod controller;
pub mod driver;
pub mod intent;
pub mod view;

pub use coalescer::Coalescer;
pub use controller::{Controller, FlushReport};
pub use intent::{CommitMode, InputOrigin, Intent};
pub use view::{NoteView, RecordingView, ViewEvent, Widget};
