mod commands;
mod handlers;
pub mod session;
mod terminal_view;

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_add, handle_color, handle_delete, handle_edit, handle_init, handle_key, handle_list,
    handle_reset, handle_resize, handle_session, handle_show,
};
pub use terminal_view::{format_note, TerminalView};
