//! InMemoryStateStore - 開発用・テスト用の StateStore
//!
//! プロセス終了で消える。再起動をまたぐ挙動の確認には SqliteStateStore を使う。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::domain::{IdempotencyKey, RelayError};
use crate::ports::{MarkOutcome, StateStore};

#[derive(Default)]
struct Relations {
    hooks: HashMap<String, String>,
    cursors: HashMap<String, String>,
    deliveries: HashMap<IdempotencyKey, DateTime<Utc>>,
}

#[derive(Default)]
pub struct InMemoryStateStore {
    relations: Mutex<Relations>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Relations>, RelayError> {
        self.relations
            .lock()
            .map_err(|_| RelayError::Store("in-memory store lock poisoned".into()))
    }

    /// All ledger keys, sorted.
    pub fn delivered_keys(&self) -> Vec<String> {
        let Ok(relations) = self.lock() else {
            return Vec::new();
        };
        let mut keys: Vec<String> = relations
            .deliveries
            .keys()
            .map(|k| k.as_str().to_string())
            .collect();
        keys.sort();
        keys
    }

    pub fn hook_count(&self) -> usize {
        self.lock().map(|r| r.hooks.len()).unwrap_or(0)
    }

    /// Stored cursor without a fallback.
    pub fn cursor(&self, name: &str) -> Option<String> {
        self.lock().ok()?.cursors.get(name).cloned()
    }
}

impl StateStore for InMemoryStateStore {
    fn get_hook(&self, event: &str) -> Result<Option<String>, RelayError> {
        Ok(self.lock()?.hooks.get(event).cloned())
    }

    fn set_hook(&self, event: &str, url: &str) -> Result<(), RelayError> {
        self.lock()?.hooks.insert(event.to_string(), url.to_string());
        Ok(())
    }

    fn get_cursor(&self, name: &str, fallback: &str) -> Result<String, RelayError> {
        Ok(self
            .lock()?
            .cursors
            .get(name)
            .cloned()
            .unwrap_or_else(|| fallback.to_string()))
    }

    fn set_cursor(&self, name: &str, value: &str) -> Result<(), RelayError> {
        self.lock()?
            .cursors
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn is_delivered(&self, key: &IdempotencyKey) -> Result<bool, RelayError> {
        Ok(self.lock()?.deliveries.contains_key(key))
    }

    fn mark_delivered(
        &self,
        key: &IdempotencyKey,
        delivered_at: DateTime<Utc>,
    ) -> Result<MarkOutcome, RelayError> {
        let mut relations = self.lock()?;
        if relations.deliveries.contains_key(key) {
            return Ok(MarkOutcome::AlreadyPresent);
        }
        relations.deliveries.insert(key.clone(), delivered_at);
        Ok(MarkOutcome::Inserted)
    }
}
