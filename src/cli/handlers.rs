use std::env;
use std::fs;
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::session::parse_line;
use super::terminal_view::{format_note, TerminalView};
use crate::config::{Config, CONFIG_FILE};
use crate::entity::{NoteId, NotePatch};
use crate::error::{Result, StickiesError};
use crate::repository::NoteRepository;
use crate::storage::{SqliteStore, STICKIES_DIR};
use crate::sync::{driver, CommitMode, Controller, InputOrigin, Intent};

type CliController = Controller<SqliteStore, TerminalView>;

/// Find the project root by looking for .stickies/ or .git/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(STICKIES_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

/// Open the project store and hydrate a controller whose startup render is
/// suppressed unless `show_startup` is set.
fn open_controller(show_startup: bool) -> Result<CliController> {
    let root = find_project_root();
    let store = SqliteStore::open(&root)?;
    let config = Config::load(store.stickies_dir())?;

    let repo = NoteRepository::with_config(store, &config);
    let view = if show_startup {
        TerminalView::new()
    } else {
        TerminalView::muted()
    };
    let mut controller = Controller::new(repo, view, &config);

    let report = controller.startup()?;
    for err in &report.recovered {
        eprintln!("Warning: {}", err);
    }
    controller.view_mut().set_muted(false);
    Ok(controller)
}

fn warn_if_degraded(controller: &CliController) {
    if controller.is_degraded() {
        eprintln!("Warning: changes could not be saved; see log output for details");
    }
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;

    let store = SqliteStore::init(&root)?;
    let config_path = store.stickies_dir().join(CONFIG_FILE);
    fs::write(&config_path, serde_yaml::to_string(&Config::default())?)?;

    println!("Initialized stickies project in {}", root.display());
    Ok(())
}

pub fn handle_add(json: bool) -> Result<()> {
    let mut controller = open_controller(false)?;
    controller.view_mut().set_muted(json);
    controller.handle(Intent::AddRequested)?;
    warn_if_degraded(&controller);

    if json {
        if let Some(note) = controller.repository().list_notes().last() {
            println!("{}", serde_json::to_string_pretty(note)?);
        }
    }
    Ok(())
}

pub fn handle_list(json: bool) -> Result<()> {
    let controller = open_controller(false)?;
    let repo = controller.repository();

    if json {
        #[derive(serde::Serialize)]
        struct ListJson<'a> {
            color: &'a str,
            id_counter: NoteId,
            notes: &'a [crate::entity::Note],
        }

        let out = ListJson {
            color: repo.active_color(),
            id_counter: repo.id_counter(),
            notes: repo.list_notes(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if repo.list_notes().is_empty() {
        println!("No notes.");
    } else {
        for note in repo.list_notes() {
            println!("{}", format_note(note, repo.active_color()));
        }
    }
    Ok(())
}

pub fn handle_show() -> Result<()> {
    let controller = open_controller(true)?;
    warn_if_degraded(&controller);
    Ok(())
}

pub fn handle_edit(id: NoteId, content: String) -> Result<()> {
    let mut controller = open_controller(false)?;

    let changed = controller
        .repository()
        .get_note(id)
        .is_some_and(|note| NotePatch::content(content.as_str()).differs_from(note));
    controller.handle(Intent::ContentChanged {
        id,
        content,
        commit: CommitMode::Immediate,
    })?;
    warn_if_degraded(&controller);

    if changed {
        println!("Updated note {}", id);
    } else {
        println!("Note {} unchanged", id);
    }
    Ok(())
}

pub fn handle_resize(id: NoteId, width: f64, height: f64) -> Result<()> {
    let mut controller = open_controller(false)?;

    let changed = controller
        .repository()
        .get_note(id)
        .is_some_and(|note| NotePatch::geometry(width, height).differs_from(note));
    controller.handle(Intent::GeometryChanged {
        id,
        width,
        height,
        commit: CommitMode::Immediate,
    })?;
    warn_if_degraded(&controller);

    if changed {
        println!("Resized note {} to {}x{}", id, width, height);
    } else {
        println!("Note {} unchanged", id);
    }
    Ok(())
}

pub fn handle_delete(id: NoteId) -> Result<()> {
    let mut controller = open_controller(false)?;
    if controller.repository().get_note(id).is_none() {
        println!("Note {} does not exist; nothing to delete.", id);
        return Ok(());
    }

    controller.handle(Intent::DeleteRequested { id })?;
    warn_if_degraded(&controller);
    Ok(())
}

pub fn handle_color(value: String) -> Result<()> {
    let mut controller = open_controller(false)?;

    if value.trim().is_empty() {
        eprintln!("Warning: blank color ignored");
        return Ok(());
    }

    controller.handle(Intent::ColorChanged { color: value })?;
    warn_if_degraded(&controller);
    Ok(())
}

pub fn handle_key(key: char, origin: InputOrigin) -> Result<()> {
    let mut controller = open_controller(false)?;
    let before = controller.repository().list_notes().len();

    controller.handle(Intent::ShortcutPressed { key, origin })?;
    warn_if_degraded(&controller);

    if controller.repository().list_notes().len() == before {
        println!("Key '{}' ignored ({})", key, origin);
    }
    Ok(())
}

pub fn handle_reset(force: bool) -> Result<()> {
    if !force {
        eprintln!("Refusing to reset without --force");
        return Err(StickiesError::Config("reset requires --force".to_string()));
    }

    let controller = open_controller(false)?;
    let (mut repo, _) = controller.into_parts();
    repo.reset()?;
    println!("Reset all notes");
    Ok(())
}

pub fn handle_session() -> Result<()> {
    let controller = open_controller(true)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let (tx, rx) = mpsc::channel::<Intent>(64);

        let reader = async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                tokio::select! {
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => match parse_line(&line) {
                            Ok(Some(intent)) => {
                                if tx.send(intent).await.is_err() {
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => eprintln!("Warning: {}", e),
                        },
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "stdin read failed; ending session");
                            break;
                        }
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        };

        let (result, ()) = tokio::join!(driver::run(controller, rx), reader);
        let controller = result?;
        warn_if_degraded(&controller);
        Ok::<(), StickiesError>(())
    })
}
