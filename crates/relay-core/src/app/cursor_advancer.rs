//! CursorAdvancer - サイクル内の最大 timestamp を追跡し、完了後にだけ永続化する
//!
//! 途中で失敗したサイクルは `commit` まで到達しないので、カーソルは動かない。
//! クラッシュ時の再処理は高々 1 サイクル分で、配送済みは ledger が吸収する。

use chrono::{DateTime, Utc};

use crate::domain::timestamp::canonical;
use crate::domain::{NormalizedChange, RelayError, TimestampSource};
use crate::ports::StateStore;

#[derive(Debug, Clone)]
pub struct CursorAdvancer {
    name: String,
    start: DateTime<Utc>,
    newest: DateTime<Utc>,
}

impl CursorAdvancer {
    pub fn new(name: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            start,
            newest: start,
        }
    }

    /// Continue a maximum carried over from an earlier, truncated cycle.
    pub fn resume(name: impl Into<String>, start: DateTime<Utc>, newest: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            start,
            newest: newest.max(start),
        }
    }

    /// Track the change's timestamp. Clock-derived timestamps are ignored so a
    /// record without an update field cannot push the cursor past the poll time.
    pub fn observe(&mut self, change: &NormalizedChange) {
        if change.timestamp_source == TimestampSource::Record && change.occurred_at > self.newest {
            self.newest = change.occurred_at;
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn newest(&self) -> DateTime<Utc> {
        self.newest
    }

    /// Persist the running maximum. Consumes the advancer: one commit per cycle.
    pub fn commit(self, store: &dyn StateStore) -> Result<DateTime<Utc>, RelayError> {
        store.set_cursor(&self.name, &canonical(&self.newest))?;
        Ok(self.newest)
    }

    /// Persist the start value instead of the maximum. Used when the cycle
    /// did not see the whole result set.
    pub fn hold(self, store: &dyn StateStore) -> Result<DateTime<Utc>, RelayError> {
        store.set_cursor(&self.name, &canonical(&self.start))?;
        Ok(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryStateStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, hour, 0, 0).unwrap()
    }

    fn change(ts: DateTime<Utc>, source: TimestampSource) -> NormalizedChange {
        NormalizedChange {
            id: "1".into(),
            occurred_at: ts,
            timestamp_source: source,
            data: json!({}),
        }
    }

    #[test]
    fn keeps_the_maximum_regardless_of_order() {
        let mut advancer = CursorAdvancer::new("tickets", at(1));
        advancer.observe(&change(at(5), TimestampSource::Record));
        advancer.observe(&change(at(3), TimestampSource::Record));
        assert_eq!(advancer.newest(), at(5));
    }

    #[test]
    fn never_moves_below_the_start() {
        let mut advancer = CursorAdvancer::new("tickets", at(4));
        advancer.observe(&change(at(2), TimestampSource::Record));
        assert_eq!(advancer.newest(), at(4));
    }

    #[test]
    fn clock_timestamps_do_not_advance() {
        let mut advancer = CursorAdvancer::new("tickets", at(1));
        advancer.observe(&change(at(9), TimestampSource::Clock));
        assert_eq!(advancer.newest(), at(1));
    }

    #[test]
    fn commit_writes_the_canonical_form() {
        let store = InMemoryStateStore::new();
        let mut advancer = CursorAdvancer::new("tickets", at(1));
        advancer.observe(&change(at(2), TimestampSource::Record));
        advancer.commit(&store).unwrap();
        assert_eq!(store.cursor("tickets").as_deref(), Some("2024-08-01T02:00:00Z"));
    }

    #[test]
    fn resume_carries_the_earlier_maximum() {
        let mut advancer = CursorAdvancer::resume("tickets", at(1), at(6));
        advancer.observe(&change(at(4), TimestampSource::Record));
        assert_eq!(advancer.newest(), at(6));

        let below_start = CursorAdvancer::resume("tickets", at(3), at(2));
        assert_eq!(below_start.newest(), at(3));
    }

    #[test]
    fn hold_writes_the_start_not_the_maximum() {
        let store = InMemoryStateStore::new();
        let mut advancer = CursorAdvancer::new("tickets", at(1));
        advancer.observe(&change(at(7), TimestampSource::Record));
        assert_eq!(advancer.hold(&store).unwrap(), at(1));
        assert_eq!(store.cursor("tickets").as_deref(), Some("2024-08-01T01:00:00Z"));
    }
}
