//! Durable key-value store contract and implementations.
//!
//! # Responsibility
//! - Provide the get/set blob storage the workspace persists through.
//! - Keep SQL details inside the repository boundary.
//!
//! # Invariants
//! - `set` replaces the whole value for a key; there are no partial writes.
//! - `get` of a never-written key is `Ok(None)`, not an error.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use log::error;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from durable storage.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Stored value could not be encoded or decoded.
    Serialization(serde_json::Error),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Write rejected by the backend.
    WriteFailed(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "invalid stored value: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "key-value store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::WriteFailed(message) => write!(f, "write failed: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::WriteFailed(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Blob storage keyed by string.
pub trait KeyValueStore {
    /// Loads the value for `key`, if any.
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> RepoResult<()>;
}

/// SQLite-backed key-value store.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    /// Creates the store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteKvStore<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO kv_entries (key, value)
                 VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE
                 SET value = excluded.value,
                     updated_at = (strftime('%s', 'now') * 1000);",
                params![key, value],
            )
            .map_err(|err| {
                error!("event=kv_set module=repo status=error key={key} error={err}");
                RepoError::from(err)
            })?;
        Ok(())
    }
}

/// In-memory key-value store for tests and ephemeral sessions.
///
/// Single-threaded; `RefCell` backs the `&self` writes.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `set` fail, for error-path tests.
    pub fn set_simulate_write_error(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Writes a raw value, bypassing the write-error switch.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        if self.fail_writes.get() {
            return Err(RepoError::WriteFailed("simulated write error".to_string()));
        }
        self.insert_raw(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, MemoryKvStore, RepoError, SqliteKvStore};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;

    #[test]
    fn sqlite_store_overwrites_values() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::try_new(&conn).unwrap();

        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn sqlite_store_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteKvStore::try_new(&conn).err().unwrap();
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }

    #[test]
    fn memory_store_can_simulate_write_failure() {
        let store = MemoryKvStore::new();
        store.set("k", "v").unwrap();
        store.set_simulate_write_error(true);
        assert!(matches!(store.set("k", "w"), Err(RepoError::WriteFailed(_))));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
