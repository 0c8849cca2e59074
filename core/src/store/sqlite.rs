use super::SnapshotStore;
use crate::error::{StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

/// Snapshot kept in a one-row SQLite table.
pub struct SqliteSnapshotStore {
    conn: Connection,
    path: Option<String>, // None for :memory:
}

impl SqliteSnapshotStore {
    /// Open (or create) the backup database at `path`.
    pub fn open(path: &str) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        log::debug!("store: opened backup database {path}");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> StorageResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_backup.sql"))?;
        Ok(())
    }

    /// When the current snapshot was written, if there is one.
    pub fn written_at(&self) -> StorageResult<Option<String>> {
        let written_at = self
            .conn
            .query_row("SELECT written_at FROM game_backup WHERE slot = 0", [], |row| row.get(0))
            .optional()?;
        Ok(written_at)
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn exists(&self) -> bool {
        match self
            .conn
            .query_row("SELECT 1 FROM game_backup WHERE slot = 0", [], |_| Ok(()))
            .optional()
        {
            Ok(row) => row.is_some(),
            Err(e) => {
                log::warn!("store: cannot check {} for a backup: {e}", self.location());
                false
            }
        }
    }

    fn read(&self) -> StorageResult<Vec<u8>> {
        self.conn
            .query_row("SELECT content FROM game_backup WHERE slot = 0", [], |row| row.get(0))
            .optional()?
            .ok_or_else(|| StorageError::Missing { location: self.location() })
    }

    fn write(&self, bytes: &[u8]) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO game_backup (slot, content, written_at) VALUES (0, ?1, ?2)",
            params![bytes, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete(&self) -> StorageResult<()> {
        let removed = self.conn.execute("DELETE FROM game_backup WHERE slot = 0", [])?;
        if removed > 0 {
            log::debug!("store: removed snapshot from {}", self.location());
        }
        Ok(())
    }

    fn location(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite:{path}"),
            None => "sqlite::memory:".to_string(),
        }
    }
}
