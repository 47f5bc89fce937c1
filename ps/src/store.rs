//! PlanStore trait and implementations
//!
//! The store holds one JSON document per account. Saving `None` clears
//! the account's document (the "start a new day" path).

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::now_ms;

/// Boundary interface to plan persistence
///
/// Implementors take `&mut self`: the store is owned by a single actor
/// and never shared across threads directly.
pub trait PlanStore: Send {
    /// Save (or clear, when `doc` is `None`) the plan document for an account
    fn save(&mut self, account: &str, doc: Option<&Value>) -> Result<(), StoreError>;

    /// Load the plan document for an account, `None` if absent
    fn load(&mut self, account: &str) -> Result<Option<Value>, StoreError>;
}

/// SQLite-backed store, one row per account
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if necessary) a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        info!(path = %path.display(), "Opened plan store");
        Ok(Self { conn })
    }

    /// Open an in-memory store (tests)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS plans (
                account    TEXT PRIMARY KEY,
                doc        TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl PlanStore for SqliteStore {
    fn save(&mut self, account: &str, doc: Option<&Value>) -> Result<(), StoreError> {
        match doc {
            Some(doc) => {
                let serialized = serde_json::to_string(doc)?;
                self.conn.execute(
                    "INSERT INTO plans (account, doc, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(account) DO UPDATE SET doc = ?2, updated_at = ?3",
                    params![account, serialized, now_ms()],
                )?;
                debug!(%account, "Saved plan document");
            }
            None => {
                self.conn
                    .execute("DELETE FROM plans WHERE account = ?1", params![account])?;
                debug!(%account, "Cleared plan document");
            }
        }
        Ok(())
    }

    fn load(&mut self, account: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT doc FROM plans WHERE account = ?1", params![account], |row| {
                row.get(0)
            })
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

/// In-memory store for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    docs: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlanStore for MemoryStore {
    fn save(&mut self, account: &str, doc: Option<&Value>) -> Result<(), StoreError> {
        match doc {
            Some(doc) => {
                self.docs.insert(account.to_string(), doc.clone());
            }
            None => {
                self.docs.remove(account);
            }
        }
        Ok(())
    }

    fn load(&mut self, account: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.docs.get(account).cloned())
    }
}
