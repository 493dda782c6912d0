//! PollCycle - poll → normalize → dedup/deliver → advance cursor を 1 回実行する
//!
//! 同時に走るサイクルは高々ひとつ。`run_guarded` は実行中なら即座に
//! `CycleOutcome::Skipped` を返す。
//!
//! `AllPages` でページ上限に達したときはカーソルを据え置き、次のサイクルが
//! 同じ `since` のまま続きのページから読む。結果セットを読み切った時点で
//! 持ち越した最大値をコミットする。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{Instrument, error, info, info_span, warn};

use super::cursor_advancer::CursorAdvancer;
use super::engine::{DeliveryEngine, EngineStep};
use super::normalizer::normalize;
use crate::config::PaginationMode;
use crate::domain::timestamp::{canonical, parse_timestamp};
use crate::domain::{CycleId, RelayError, ResourceSpec};
use crate::ports::{Clock, IdGenerator, PageRequest, StateStore, UpstreamSource};

/// Counters for one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle_id: CycleId,
    pub started_cursor: DateTime<Utc>,
    pub new_cursor: DateTime<Utc>,
    pub pages: u32,
    pub fetched: usize,
    pub delivered: usize,
    pub no_subscriber: usize,
    pub already_delivered: usize,
    /// Set when the page cap was hit; the next cycle continues from here.
    pub resume_page: Option<u32>,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Failed { cycle_id: CycleId, error: RelayError },
    /// Another cycle was still in flight.
    Skipped,
}

pub struct CycleSettings {
    pub resource: ResourceSpec,
    pub page_size: u32,
    pub pagination: PaginationMode,
    /// How far back the first-ever cycle looks.
    pub cursor_lookback: chrono::Duration,
}

/// Where a capped `AllPages` walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageResume {
    since: DateTime<Utc>,
    next_page: u32,
    newest: DateTime<Utc>,
}

pub struct PollCycle {
    upstream: Arc<dyn UpstreamSource>,
    engine: DeliveryEngine,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    settings: CycleSettings,
    in_flight: Mutex<Option<PageResume>>,
}

impl PollCycle {
    pub fn new(
        upstream: Arc<dyn UpstreamSource>,
        engine: DeliveryEngine,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        settings: CycleSettings,
    ) -> Self {
        Self {
            upstream,
            engine,
            store,
            clock,
            ids,
            settings,
            in_flight: Mutex::new(None),
        }
    }

    /// Run one cycle unless one is already running. Never panics on cycle
    /// errors; they come back as `CycleOutcome::Failed`.
    pub async fn run_guarded(&self) -> CycleOutcome {
        let Ok(mut resume) = self.in_flight.try_lock() else {
            warn!("previous poll cycle still running, skipping");
            return CycleOutcome::Skipped;
        };

        let cycle_id = self.ids.generate_cycle_id();
        let span = info_span!("poll_cycle", cycle_id = %cycle_id);
        match self.run_once(cycle_id, &mut resume).instrument(span.clone()).await {
            Ok(report) => CycleOutcome::Completed(report),
            Err(err) => {
                span.in_scope(|| {
                    error!(kind = err.kind().as_str(), error = %err, "poll cycle failed");
                });
                CycleOutcome::Failed { cycle_id, error: err }
            }
        }
    }

    async fn run_once(
        &self,
        cycle_id: CycleId,
        resume: &mut Option<PageResume>,
    ) -> Result<CycleReport, RelayError> {
        let resource = &self.settings.resource;
        let start = self.load_cursor()?;
        let carried = resume.take().filter(|r| r.since == start);
        let mut advancer = match carried {
            Some(r) => {
                info!(page = r.next_page, "resuming capped page walk");
                CursorAdvancer::resume(resource.cursor_name(), start, r.newest)
            }
            None => CursorAdvancer::new(resource.cursor_name(), start),
        };
        let mut report = CycleReport {
            cycle_id,
            started_cursor: start,
            new_cursor: start,
            pages: 0,
            fetched: 0,
            delivered: 0,
            no_subscriber: 0,
            already_delivered: 0,
            resume_page: None,
        };

        let per_page = self.settings.page_size;
        let first_page = carried.map_or(1, |r| r.next_page);
        let last_page = first_page.saturating_add(self.settings.pagination.max_pages() - 1);
        let mut exhausted = false;
        for page in first_page..=last_page {
            let request = PageRequest {
                since: start,
                page,
                per_page,
            };
            let records = self.upstream.fetch_page(&request).await?;
            let fetched = records.len();
            report.pages += 1;
            report.fetched += fetched;

            for change in normalize(records, self.clock.as_ref()) {
                advancer.observe(&change);
                match self.engine.process(&change).await? {
                    EngineStep::Delivered { .. } => report.delivered += 1,
                    EngineStep::NoSubscriber => report.no_subscriber += 1,
                    EngineStep::AlreadyDelivered => report.already_delivered += 1,
                }
            }

            if fetched < per_page as usize {
                exhausted = true;
                break;
            }
        }

        let capped = !exhausted && matches!(self.settings.pagination, PaginationMode::AllPages { .. });
        if capped {
            let next_page = last_page.saturating_add(1);
            warn!(
                last_page,
                next_page,
                cursor = %canonical(&start),
                "page cap reached with more results pending, holding cursor"
            );
            *resume = Some(PageResume {
                since: start,
                next_page,
                newest: advancer.newest(),
            });
            report.resume_page = Some(next_page);
            report.new_cursor = advancer.hold(self.store.as_ref())?;
        } else {
            report.new_cursor = advancer.commit(self.store.as_ref())?;
        }
        info!(
            pages = report.pages,
            fetched = report.fetched,
            delivered = report.delivered,
            no_subscriber = report.no_subscriber,
            already_delivered = report.already_delivered,
            cursor = %canonical(&report.new_cursor),
            "poll cycle completed"
        );
        Ok(report)
    }

    fn load_cursor(&self) -> Result<DateTime<Utc>, RelayError> {
        let fallback = canonical(&(self.clock.now() - self.settings.cursor_lookback));
        let stored = self
            .store
            .get_cursor(self.settings.resource.cursor_name(), &fallback)?;
        parse_timestamp(&stored).ok_or_else(|| {
            RelayError::Store(format!("stored cursor {stored:?} is not an RFC 3339 timestamp"))
        })
    }
}
