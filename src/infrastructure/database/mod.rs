//! SQLite plugin record storage

use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::application::errors::StorageError;
use crate::domain::entities::{NewPluginRecord, PluginRecord};
use crate::domain::traits::PluginStore;

/// SQLite-backed table of installed plugins
pub struct SqlitePluginStore {
    conn: Mutex<Connection>,
}

impl SqlitePluginStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        self.conn()?.execute(
            "CREATE TABLE IF NOT EXISTS plugins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                version TEXT NOT NULL,
                installed_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            )",
            [],
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Internal("Lock poisoned".to_string()))
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<PluginRecord> {
        Ok(PluginRecord {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            version: row.get(2)?,
            installed_at: row.get(3)?,
        })
    }
}

#[async_trait]
impl PluginStore for SqlitePluginStore {
    async fn find_all(&self) -> Result<Vec<PluginRecord>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, version, installed_at FROM plugins ORDER BY id",
        )?;

        let rows = stmt.query_map([], Self::from_row)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    async fn find_one(&self, id: i64) -> Result<Option<PluginRecord>, StorageError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT id, name, version, installed_at FROM plugins WHERE id = ?1",
                [id],
                Self::from_row,
            )
            .optional()?;
        Ok(record)
    }

    async fn create(&self, record: NewPluginRecord) -> Result<PluginRecord, StorageError> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO plugins (name, version) VALUES (?1, ?2)",
            rusqlite::params![record.name, record.version],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(StorageError::Duplicate(record.name));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        let stored = conn.query_row(
            "SELECT id, name, version, installed_at FROM plugins WHERE id = ?1",
            [id],
            Self::from_row,
        )?;
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let rows = self.conn()?.execute("DELETE FROM plugins WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }
}
