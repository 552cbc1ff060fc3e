use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use super::KeyValueStore;
use crate::error::{Result, StickiesError};

pub const STICKIES_DIR: &str = ".stickies";
pub const NOTES_DB: &str = "notes.db";

/// Durable key-value store backed by a single SQLite table.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Initialize a new stickies project under `root`
    pub fn init(root: &Path) -> Result<Self> {
        let dir = root.join(STICKIES_DIR);

        if dir.exists() {
            return Err(StickiesError::AlreadyInitialized);
        }

        fs::create_dir_all(&dir)?;
        Self::open_at(&dir.join(NOTES_DB))
    }

    /// Open an existing stickies project under `root`
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(STICKIES_DIR).join(NOTES_DB);

        if !path.exists() {
            return Err(StickiesError::NotInitialized);
        }

        Self::open_at(&path)
    }

    /// Open or create the database file at `path`
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(StickiesError::unavailable)?;
        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                )",
                [],
            )
            .map_err(StickiesError::unavailable)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the database (and the optional config file)
    pub fn stickies_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(StickiesError::unavailable)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(StickiesError::unavailable)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv", [])
            .map_err(StickiesError::unavailable)?;
        Ok(())
    }
}
