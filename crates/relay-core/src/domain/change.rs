//! Change - 正規化済みの変更と配送用エンベロープ

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resource::ResourceSpec;
use super::timestamp::canonical;

/// One upstream record after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedChange {
    pub id: String,
    pub occurred_at: DateTime<Utc>,
    /// Whether `occurred_at` came from the record or from the clock.
    pub timestamp_source: TimestampSource,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    Record,
    /// No usable timestamp field; the key is not stable across retries.
    Clock,
}

impl NormalizedChange {
    pub fn idempotency_key(&self, resource: &ResourceSpec) -> IdempotencyKey {
        IdempotencyKey::new(&resource.kind, &self.id, &self.occurred_at)
    }
}

/// `<resource-type>:<id>:<occurred_at>`; the unit of at-most-once delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(kind: &str, id: &str, occurred_at: &DateTime<Utc>) -> Self {
        IdempotencyKey(format!("{kind}:{id}:{}", canonical(occurred_at)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for IdempotencyKey {
    fn from(s: &str) -> Self {
        IdempotencyKey(s.to_string())
    }
}

/// Outbound webhook body.
///
/// Wire shape: `{ source, event, occurred_at, idempotency_key, data }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub source: String,
    #[serde(rename = "event")]
    pub event_name: String,
    pub occurred_at: String,
    pub idempotency_key: IdempotencyKey,
    pub data: serde_json::Value,
}

impl ChangeEvent {
    pub fn from_change(resource: &ResourceSpec, change: &NormalizedChange) -> Self {
        Self {
            source: resource.source.clone(),
            event_name: resource.event.clone(),
            occurred_at: canonical(&change.occurred_at),
            idempotency_key: change.idempotency_key(resource),
            data: change.data.clone(),
        }
    }
}
