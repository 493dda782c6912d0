//! SqliteStateStore - 本番用の StateStore（単一ファイル）
//!
//! スキーマは起動時に `CREATE TABLE IF NOT EXISTS` で作成する。
//! マイグレーションの仕組みは持たない。

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::domain::timestamp::canonical;
use crate::domain::{IdempotencyKey, RelayError};
use crate::ports::{MarkOutcome, StateStore};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS hooks (
        event TEXT PRIMARY KEY,
        url   TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS cursors (
        name  TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS deliveries (
        idempotency_key TEXT PRIMARY KEY,
        delivered_at    TEXT NOT NULL
    );
";

pub struct SqliteStateStore {
    conn: Mutex<Connection>,
}

impl SqliteStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let conn = Connection::open(path)?;
        Self::bootstrap(conn)
    }

    pub fn in_memory() -> Result<Self, RelayError> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self, RelayError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RelayError> {
        self.conn
            .lock()
            .map_err(|_| RelayError::Store("sqlite connection lock poisoned".into()))
    }
}

impl StateStore for SqliteStateStore {
    fn get_hook(&self, event: &str) -> Result<Option<String>, RelayError> {
        let url = self
            .conn()?
            .query_row(
                "SELECT url FROM hooks WHERE event = ?1",
                params![event],
                |row| row.get(0),
            )
            .optional()?;
        Ok(url)
    }

    fn set_hook(&self, event: &str, url: &str) -> Result<(), RelayError> {
        self.conn()?.execute(
            "INSERT INTO hooks (event, url) VALUES (?1, ?2)
             ON CONFLICT(event) DO UPDATE SET url = excluded.url",
            params![event, url],
        )?;
        Ok(())
    }

    fn get_cursor(&self, name: &str, fallback: &str) -> Result<String, RelayError> {
        let value: Option<String> = self
            .conn()?
            .query_row(
                "SELECT value FROM cursors WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or_else(|| fallback.to_string()))
    }

    fn set_cursor(&self, name: &str, value: &str) -> Result<(), RelayError> {
        self.conn()?.execute(
            "INSERT INTO cursors (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![name, value],
        )?;
        Ok(())
    }

    fn is_delivered(&self, key: &IdempotencyKey) -> Result<bool, RelayError> {
        let found: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT 1 FROM deliveries WHERE idempotency_key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn mark_delivered(
        &self,
        key: &IdempotencyKey,
        delivered_at: DateTime<Utc>,
    ) -> Result<MarkOutcome, RelayError> {
        let inserted = self.conn()?.execute(
            "INSERT INTO deliveries (idempotency_key, delivered_at) VALUES (?1, ?2)
             ON CONFLICT(idempotency_key) DO NOTHING",
            params![key.as_str(), canonical(&delivered_at)],
        )?;
        Ok(if inserted == 1 {
            MarkOutcome::Inserted
        } else {
            MarkOutcome::AlreadyPresent
        })
    }
}
