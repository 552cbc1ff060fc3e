//! Line protocol for `stickies session`.
//!
//! One command per line:
//!
//! ```text
//! add
//! type <id> <text>        live edit (coalesced)
//! commit <id> <text>      edit written immediately
//! drag <id> <w> <h>       live resize (coalesced)
//! resize <id> <w> <h>     resize written immediately
//! delete <id>
//! color <value>
//! key <char> [origin]
//! ```

use crate::entity::NoteId;
use crate::sync::{CommitMode, InputOrigin, Intent};

/// Parse one session line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Intent>, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = match trimmed.split_once(' ') {
        Some((command, rest)) => (command, rest),
        None => (trimmed, ""),
    };

    let intent = match command {
        "add" => Intent::AddRequested,
        "type" | "commit" => {
            let (id, text) = split_id(rest)?;
            let commit = if command == "type" {
                CommitMode::Live
            } else {
                CommitMode::Immediate
            };
            Intent::ContentChanged {
                id,
                content: text.to_string(),
                commit,
            }
        }
        "drag" | "resize" => {
            let (id, dims) = split_id(rest)?;
            let mut parts = dims.split_whitespace();
            let width = parse_side(parts.next(), "width")?;
            let height = parse_side(parts.next(), "height")?;
            let commit = if command == "drag" {
                CommitMode::Live
            } else {
                CommitMode::Immediate
            };
            Intent::GeometryChanged {
                id,
                width,
                height,
                commit,
            }
        }
        "delete" => {
            let (id, _) = split_id(rest)?;
            Intent::DeleteRequested { id }
        }
        "color" => Intent::ColorChanged {
            color: rest.to_string(),
        },
        "key" => {
            let mut parts = rest.split_whitespace();
            let key = parts
                .next()
                .and_then(|k| {
                    let mut chars = k.chars();
                    let c = chars.next()?;
                    chars.next().is_none().then_some(c)
                })
                .ok_or_else(|| "key expects a single character".to_string())?;
            let origin = match parts.next() {
                Some(origin) => origin.parse::<InputOrigin>()?,
                None => InputOrigin::Other,
            };
            Intent::ShortcutPressed { key, origin }
        }
        other => return Err(format!("Unknown session command: {}", other)),
    };

    Ok(Some(intent))
}

fn split_id(rest: &str) -> Result<(NoteId, &str), String> {
    let (id, tail) = match rest.split_once(' ') {
        Some((id, tail)) => (id, tail),
        None => (rest, ""),
    };
    let id = id
        .trim()
        .parse::<NoteId>()
        .map_err(|_| format!("Invalid note id: '{}'", id.trim()))?;
    Ok((id, tail))
}

fn parse_side(value: Option<&str>, name: &str) -> Result<f64, String> {
    let value = value.ok_or_else(|| format!("Missing {}", name))?;
    value
        .parse::<f64>()
        .map_err(|_| format!("Invalid {}: '{}'", name, value))
}
