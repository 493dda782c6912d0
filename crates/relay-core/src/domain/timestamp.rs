//! Timestamp helpers.
//!
//! 文字列比較ではなく `DateTime<Utc>` として比較する。
//! 永続化とキー生成には同じ正規形を使う。

use chrono::{DateTime, SecondsFormat, Utc};

/// Parse an RFC 3339 timestamp (any offset) into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Canonical string form used for cursors and idempotency keys.
pub fn canonical(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
