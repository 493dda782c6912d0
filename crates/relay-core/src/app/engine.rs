//! DeliveryEngine - dedup と配送
//!
//! # フロー（レコードごと、上流の順序で）
//! 1. idempotency key を計算
//! 2. ledger にあればスキップ
//! 3. ChangeEvent を組み立てて DeliverySink を同期的に待つ
//! 4. 成功したら ledger にマーク
//! 5. 失敗したらエラーを返し、サイクルの残りを中断（未マークなので次サイクルで再試行）
//!
//! キーごとの状態遷移は `unseen → delivered` のみ。

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{ChangeEvent, NormalizedChange, RelayError, ResourceSpec};
use crate::ports::{Clock, DeliveryOutcome, DeliverySink, MarkOutcome, StateStore};

/// What happened to one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStep {
    AlreadyDelivered,
    Delivered { status: u16 },
    /// Nothing registered for the event; marked delivered without a call.
    NoSubscriber,
}

pub struct DeliveryEngine {
    store: Arc<dyn StateStore>,
    sink: Arc<dyn DeliverySink>,
    clock: Arc<dyn Clock>,
    resource: ResourceSpec,
}

impl DeliveryEngine {
    pub fn new(
        store: Arc<dyn StateStore>,
        sink: Arc<dyn DeliverySink>,
        clock: Arc<dyn Clock>,
        resource: ResourceSpec,
    ) -> Self {
        Self {
            store,
            sink,
            clock,
            resource,
        }
    }

    pub async fn process(&self, change: &NormalizedChange) -> Result<EngineStep, RelayError> {
        let key = change.idempotency_key(&self.resource);
        if self.store.is_delivered(&key)? {
            debug!(idempotency_key = %key, "already delivered, skipping");
            return Ok(EngineStep::AlreadyDelivered);
        }

        let event = ChangeEvent::from_change(&self.resource, change);
        let step = match self.sink.deliver(&event).await? {
            DeliveryOutcome::Delivered { url, status } => {
                info!(idempotency_key = %key, %url, status, "delivered");
                EngineStep::Delivered { status }
            }
            DeliveryOutcome::NoSubscriber => {
                debug!(idempotency_key = %key, event = %event.event_name, "no subscriber, dropped");
                EngineStep::NoSubscriber
            }
        };

        if self.store.mark_delivered(&key, self.clock.now())? == MarkOutcome::AlreadyPresent {
            debug!(idempotency_key = %key, "ledger already held key");
        }
        Ok(step)
    }
}
