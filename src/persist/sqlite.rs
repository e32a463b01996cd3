//! SQLite-backed store table, one row per identity.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};

use crate::core::store::StoreSnapshot;

use super::{PersistError, PersistResult, StoreBackend};

/// SQLite implementation of [`crate::persist::StoreBackend`].
///
/// Rows hold the same JSON document the file backend writes.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Opens or creates a database at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory database.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Owners that have a stored row, sorted.
    pub fn owners(&self) -> PersistResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT owner FROM owner_stores ORDER BY owner ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl StoreBackend for SqliteBackend {
    fn load(&self, owner: &str) -> PersistResult<Option<StoreSnapshot>> {
        let payload: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT payload FROM owner_stores WHERE owner = ?1",
                params![owner],
                |row| row.get(0),
            )
            .optional()?;

        let Some(payload) = payload else {
            return Ok(None);
        };

        let snapshot = serde_json::from_slice(&payload).map_err(|source| PersistError::Corrupt {
            owner: owner.to_string(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    fn save(&mut self, owner: &str, snapshot: &StoreSnapshot) -> PersistResult<()> {
        let payload = serde_json::to_vec(snapshot)?;
        self.conn.execute(
            "INSERT INTO owner_stores(owner, updated_ms, payload) VALUES (?1, ?2, ?3)
             ON CONFLICT(owner) DO UPDATE SET updated_ms = excluded.updated_ms, payload = excluded.payload",
            params![owner, now_ms() as i64, payload],
        )?;
        tracing::debug!(owner, records = snapshot.records.len(), "saved store row");
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
