//! Status - 直近サイクルの結果（/status 用）

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cycle::CycleOutcome;
use crate::domain::timestamp::canonical;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LastResult {
    Ok,
    Error,
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub last_cycle_id: Option<String>,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_finished_at: Option<DateTime<Utc>>,
    pub last_result: Option<LastResult>,
    pub last_error: Option<String>,
    pub cycles_ok: u64,
    pub cycles_failed: u64,
    pub cycles_skipped: u64,
    pub delivered_total: u64,
    pub cursor: Option<String>,
}

/// Shared, cheaply clonable view of scheduler progress.
#[derive(Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<StatusSnapshot>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn record(
        &self,
        outcome: &CycleOutcome,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) {
        let mut status = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match outcome {
            CycleOutcome::Completed(report) => {
                status.last_cycle_id = Some(report.cycle_id.to_string());
                status.last_result = Some(LastResult::Ok);
                status.last_error = None;
                status.cycles_ok += 1;
                status.delivered_total += report.delivered as u64;
                status.cursor = Some(canonical(&report.new_cursor));
            }
            CycleOutcome::Failed { cycle_id, error } => {
                status.last_cycle_id = Some(cycle_id.to_string());
                status.last_result = Some(LastResult::Error);
                status.last_error = Some(error.to_string());
                status.cycles_failed += 1;
            }
            CycleOutcome::Skipped => {
                // 実行中のサイクルの記録は上書きしない
                status.cycles_skipped += 1;
                return;
            }
        }
        status.last_started_at = Some(started_at);
        status.last_finished_at = Some(finished_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::cycle::CycleReport;
    use crate::domain::{CycleId, RelayError};
    use chrono::TimeZone;
    use ulid::Ulid;

    fn at(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 10, min, 0).unwrap()
    }

    #[test]
    fn tracks_success_then_failure() {
        let board = StatusBoard::new();
        let cycle_id = CycleId::from_ulid(Ulid::new());
        let report = CycleReport {
            cycle_id,
            started_cursor: at(0),
            new_cursor: at(2),
            pages: 1,
            fetched: 2,
            delivered: 2,
            no_subscriber: 0,
            already_delivered: 0,
            resume_page: None,
        };

        board.record(&CycleOutcome::Completed(report), at(3), at(4));
        let snap = board.snapshot();
        assert_eq!(snap.last_result, Some(LastResult::Ok));
        assert_eq!(snap.delivered_total, 2);
        assert_eq!(snap.cursor.as_deref(), Some("2024-10-01T10:02:00Z"));

        board.record(
            &CycleOutcome::Failed {
                cycle_id,
                error: RelayError::Upstream("timeout".into()),
            },
            at(5),
            at(6),
        );
        let snap = board.snapshot();
        assert_eq!(snap.last_result, Some(LastResult::Error));
        assert_eq!(snap.cycles_ok, 1);
        assert_eq!(snap.cycles_failed, 1);
        assert!(snap.last_error.unwrap().contains("timeout"));
        // 失敗してもカーソル表示は最後に成功した値のまま
        assert_eq!(snap.cursor.as_deref(), Some("2024-10-01T10:02:00Z"));
        assert_eq!(snap.last_finished_at, Some(at(6)));
    }

    #[test]
    fn skipped_ticks_only_bump_the_counter() {
        let board = StatusBoard::new();
        board.record(&CycleOutcome::Skipped, at(0), at(0));
        let snap = board.snapshot();
        assert_eq!(snap.cycles_skipped, 1);
        assert_eq!(snap.last_result, None);
        assert_eq!(snap.last_started_at, None);
    }
}
