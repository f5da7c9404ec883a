//! SQLite persistence for counters.
//!
//! One table, `Counter`, with an auto-incrementing id. `AUTOINCREMENT` keeps
//! ids from ever being reused, even after the newest row is deleted.

use crate::model::{CounterRecord, DEFAULT_COUNTER_NAME};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// CRUD gateway over the counter table.
///
/// Implementations must serialize their own writers; callers share one
/// instance behind an `Arc`.
pub trait CounterRepository: Send + Sync {
    fn get_all(&self) -> Result<Vec<CounterRecord>>;

    /// The most recently inserted row that still exists.
    fn get_last(&self) -> Result<Option<CounterRecord>>;

    /// The highest id ever issued, including ids of deleted rows.
    fn get_last_id(&self) -> Result<Option<i64>>;

    /// Inserts a row and returns it with its assigned id.
    fn insert(&self, name: &str, value: i64) -> Result<CounterRecord>;

    fn update(&self, record: &CounterRecord) -> Result<()>;

    fn delete(&self, record: &CounterRecord) -> Result<()> {
        self.delete_by_id(record.id)
    }

    fn delete_by_id(&self, id: i64) -> Result<()>;

    fn delete_all(&self) -> Result<()>;
}

pub struct SqliteRepository {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {:?}", parent))?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

        let conn = Connection::open_with_flags(path, flags)
            .with_context(|| format!("Failed to open sqlite db at {:?}", path))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .context("Failed to set synchronous")?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .context("Failed to set busy_timeout")?;

        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory sqlite db")?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Counter database lock poisoned"))
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS Counter (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            name TEXT NOT NULL DEFAULT '{}',
            value INTEGER NOT NULL DEFAULT 0
         );",
        DEFAULT_COUNTER_NAME
    ))
    .context("Failed to initialize counter schema")
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CounterRecord> {
    Ok(CounterRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        value: row.get(2)?,
    })
}

impl CounterRepository for SqliteRepository {
    fn get_all(&self) -> Result<Vec<CounterRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, name, value FROM Counter ORDER BY id ASC")
            .context("Failed to prepare counters query")?;
        let rows = stmt
            .query_map([], row_to_record)
            .context("Failed to read counter rows")?;

        let mut counters = Vec::new();
        for row in rows {
            counters.push(row.context("Failed to decode counter row")?);
        }
        Ok(counters)
    }

    fn get_last(&self) -> Result<Option<CounterRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, value FROM Counter ORDER BY id DESC LIMIT 1",
            [],
            row_to_record,
        )
        .optional()
        .context("Failed to query last counter")
    }

    fn get_last_id(&self) -> Result<Option<i64>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT seq FROM sqlite_sequence WHERE name = 'Counter'",
            [],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to query last counter id")
    }

    fn insert(&self, name: &str, value: i64) -> Result<CounterRecord> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO Counter (name, value) VALUES (?1, ?2)",
            params![name, value],
        )
        .context("Failed to insert counter")?;
        Ok(CounterRecord::new(conn.last_insert_rowid(), name, value))
    }

    fn update(&self, record: &CounterRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE Counter SET name = ?2, value = ?3 WHERE id = ?1",
            params![record.id, record.name, record.value],
        )
        .with_context(|| format!("Failed to update counter {}", record.id))?;
        Ok(())
    }

    fn delete_by_id(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM Counter WHERE id = ?1", params![id])
            .with_context(|| format!("Failed to delete counter {}", id))?;
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM Counter", [])
            .context("Failed to delete counters")?;
        Ok(())
    }
}
