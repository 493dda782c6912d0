//! StateStore port - 永続状態の正本（source of truth）
//!
//! 3 つの独立した key-value 関係を持つ:
//! - hooks: event 名 → 配送先 URL（upsert、後勝ち）
//! - cursors: リソース名 → 最終観測 timestamp（upsert）
//! - deliveries: idempotency key → 配送時刻（insert-if-absent、書き換えなし）
//!
//! 他のコンポーネントはこの狭い get/set 契約経由でしかアクセスしない。

use chrono::{DateTime, Utc};

use crate::domain::{IdempotencyKey, RelayError};

/// Result of a write-once ledger insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Inserted,
    AlreadyPresent,
}

/// Synchronous, single-record operations.
///
/// Only one polling cycle runs at a time, and the registration endpoint only
/// touches `hooks`, so implementations need no locking beyond single-writer
/// durability.
pub trait StateStore: Send + Sync {
    fn get_hook(&self, event: &str) -> Result<Option<String>, RelayError>;

    fn set_hook(&self, event: &str, url: &str) -> Result<(), RelayError>;

    /// Returns `fallback` when no cursor is stored under `name`.
    fn get_cursor(&self, name: &str, fallback: &str) -> Result<String, RelayError>;

    fn set_cursor(&self, name: &str, value: &str) -> Result<(), RelayError>;

    fn is_delivered(&self, key: &IdempotencyKey) -> Result<bool, RelayError>;

    /// Never errors on a duplicate key; reports it instead.
    fn mark_delivered(
        &self,
        key: &IdempotencyKey,
        delivered_at: DateTime<Utc>,
    ) -> Result<MarkOutcome, RelayError>;
}
