//! Scheduler - 一定間隔でサイクルを起動する
//!
//! - サイクルはループ内で await するので重ならない
//! - tick が溜まっても `MissedTickBehavior::Skip` でまとめて捨てる
//! - `shutdown_tx` に true を送るとループを抜ける（実行中のサイクルは最後まで走る）

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::cycle::PollCycle;
use super::status::StatusBoard;
use crate::ports::Clock;

pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the loop. The first cycle runs immediately.
    pub fn spawn(
        cycle: Arc<PollCycle>,
        interval: Duration,
        clock: Arc<dyn Clock>,
        status: StatusBoard,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(scheduler_loop(cycle, interval, clock, status, shutdown_rx));
        Self { shutdown_tx, join }
    }

    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

async fn scheduler_loop(
    cycle: Arc<PollCycle>,
    interval: Duration,
    clock: Arc<dyn Clock>,
    status: StatusBoard,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_secs = interval.as_secs(), "scheduler started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    // sender dropped
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let started_at = clock.now();
        let outcome = cycle.run_guarded().await;
        status.record(&outcome, started_at, clock.now());
        debug!(?outcome, "tick handled");
    }

    info!("scheduler stopped");
}
