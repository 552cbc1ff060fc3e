use clap::Parser;
use stickies::cli::{
    handle_add, handle_color, handle_delete, handle_edit, handle_init, handle_key, handle_list,
    handle_reset, handle_resize, handle_session, handle_show, Cli, Commands,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // Logs go to stderr; stdout belongs to the rendered notes.
    let filter = EnvFilter::try_from_env("STICKIES_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::Add { json } => handle_add(json),
        Commands::List { json } => handle_list(json),
        Commands::Show => handle_show(),
        Commands::Edit { id, content } => handle_edit(id, content),
        Commands::Resize { id, width, height } => handle_resize(id, width, height),
        Commands::Delete { id } => handle_delete(id),
        Commands::Color { value } => handle_color(value),
        Commands::Key { key, origin } => handle_key(key, origin),
        Commands::Reset { force } => handle_reset(force),
        Commands::Session => handle_session(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
