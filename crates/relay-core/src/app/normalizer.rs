//! Normalizer - 生レコードを NormalizedChange に変換する
//!
//! 上流の順序をそのまま保つ（ソートしない）。返すのは一度きりの遅延イテレータ。

use serde_json::Value;
use tracing::warn;

use crate::domain::timestamp::parse_timestamp;
use crate::domain::{NormalizedChange, TimestampSource};
use crate::ports::Clock;

/// Update timestamp field names, highest priority first.
pub const TIMESTAMP_ALIASES: &[&str] = &["updated_at", "updatedAt", "modified_at", "last_modified"];

/// Lazily normalize `records` in the order given.
pub fn normalize(records: Vec<Value>, clock: &dyn Clock) -> Normalized<'_> {
    Normalized {
        records: records.into_iter(),
        clock,
    }
}

pub struct Normalized<'a> {
    records: std::vec::IntoIter<Value>,
    clock: &'a dyn Clock,
}

impl Iterator for Normalized<'_> {
    type Item = NormalizedChange;

    fn next(&mut self) -> Option<Self::Item> {
        let clock = self.clock;
        self.records.find_map(|record| normalize_one(record, clock))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.records.len()))
    }
}

fn normalize_one(record: Value, clock: &dyn Clock) -> Option<NormalizedChange> {
    let Some(id) = extract_id(&record) else {
        warn!(record = %truncate(&record), "skipping record without a usable id");
        return None;
    };

    let (occurred_at, timestamp_source) = match extract_timestamp(&record) {
        Some(ts) => (ts, TimestampSource::Record),
        None => {
            warn!(%id, "record has no update timestamp, using current time");
            (clock.now(), TimestampSource::Clock)
        }
    };

    Some(NormalizedChange {
        id,
        occurred_at,
        timestamp_source,
        data: record,
    })
}

fn extract_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First alias holding a parseable RFC 3339 string wins.
fn extract_timestamp(record: &Value) -> Option<chrono::DateTime<chrono::Utc>> {
    TIMESTAMP_ALIASES
        .iter()
        .filter_map(|alias| record.get(*alias)?.as_str())
        .find_map(parse_timestamp)
}

fn truncate(record: &Value) -> String {
    let rendered = record.to_string();
    if rendered.len() <= 120 {
        return rendered;
    }
    let mut end = 120;
    while !rendered.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &rendered[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap())
    }

    #[rstest]
    #[case(json!({"id": 1, "updated_at": "2024-07-01T10:00:00Z"}))]
    #[case(json!({"id": 1, "updatedAt": "2024-07-01T10:00:00Z"}))]
    #[case(json!({"id": 1, "modified_at": "2024-07-01T10:00:00Z"}))]
    #[case(json!({"id": 1, "last_modified": "2024-07-01T12:00:00+02:00"}))]
    fn reads_each_timestamp_alias(#[case] record: Value) {
        let clock = clock();
        let change = normalize(vec![record.clone()], &clock).next().unwrap();
        assert_eq!(change.id, "1");
        assert_eq!(
            change.occurred_at,
            Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(change.timestamp_source, TimestampSource::Record);
        assert_eq!(change.data, record);
    }

    #[test]
    fn earlier_alias_takes_priority() {
        let clock = clock();
        let record = json!({
            "id": "abc",
            "last_modified": "2024-07-01T09:00:00Z",
            "updated_at": "2024-07-01T11:00:00Z",
        });
        let change = normalize(vec![record], &clock).next().unwrap();
        assert_eq!(change.id, "abc");
        assert_eq!(
            change.occurred_at,
            Utc.with_ymd_and_hms(2024, 7, 1, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn unparseable_alias_falls_through_to_the_next() {
        let clock = clock();
        let record = json!({"id": 5, "updated_at": "garbage", "modified_at": "2024-07-01T08:00:00Z"});
        let change = normalize(vec![record], &clock).next().unwrap();
        assert_eq!(
            change.occurred_at,
            Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_timestamp_uses_the_clock() {
        let clock = clock();
        let change = normalize(vec![json!({"id": 9})], &clock).next().unwrap();
        assert_eq!(change.occurred_at, clock.now());
        assert_eq!(change.timestamp_source, TimestampSource::Clock);
    }

    #[test]
    fn keeps_upstream_order_and_skips_records_without_id() {
        let clock = clock();
        let records = vec![
            json!({"id": 3, "updated_at": "2024-07-01T10:00:00Z"}),
            json!({"name": "orphan"}),
            json!({"id": 1, "updated_at": "2024-07-01T09:00:00Z"}),
            json!({"id": "", "updated_at": "2024-07-01T09:00:00Z"}),
        ];
        let ids: Vec<String> = normalize(records, &clock).map(|c| c.id).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }
}
