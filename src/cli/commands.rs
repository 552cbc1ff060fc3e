use clap::{Parser, Subcommand};

use crate::entity::NoteId;
use crate::sync::InputOrigin;

#[derive(Parser, Debug)]
#[command(name = "stickies")]
#[command(version, about = "Persistent sticky notes with debounced write-through storage")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new stickies project in the current directory
    Init,

    /// Add a new note
    Add {
        /// Output the created note as JSON
        #[arg(long)]
        json: bool,
    },

    /// List notes in creation order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render every note with the active color
    Show,

    /// Replace a note's content
    Edit {
        /// Note ID
        id: NoteId,

        /// New content
        content: String,
    },

    /// Resize a note
    Resize {
        /// Note ID
        id: NoteId,

        /// Width in pixels
        width: f64,

        /// Height in pixels
        height: f64,
    },

    /// Delete a note
    Delete {
        /// Note ID
        id: NoteId,
    },

    /// Set the color used for every note
    Color {
        /// CSS color token (e.g. "blue", "#ffc")
        value: String,
    },

    /// Simulate a key press (the quick-add shortcut creates a note)
    Key {
        /// The key pressed
        key: char,

        /// Widget the key press came from (other, text-editor, color-input)
        #[arg(long, default_value_t = InputOrigin::Other)]
        origin: InputOrigin,
    },

    /// Remove every note and reset the id counter and color
    Reset {
        /// Skip the confirmation guard
        #[arg(long)]
        force: bool,
    },

    /// Read editing commands from stdin, coalescing live edits
    Session,
}
