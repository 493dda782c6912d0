//! DeliverySink port - 配送先への送信

use async_trait::async_trait;

use crate::domain::{ChangeEvent, RelayError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Destination answered with a success status.
    Delivered { url: String, status: u16 },
    /// No destination registered for the event; nothing was sent.
    NoSubscriber,
}

/// One outbound call per event, no retry at this layer.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, event: &ChangeEvent) -> Result<DeliveryOutcome, RelayError>;
}
