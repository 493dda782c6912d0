//! WebhookSink - 登録済み URL への HTTP POST（reqwest）
//!
//! 署名なし、リトライなし。リトライは次サイクルの未マークキーに任せる。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{ChangeEvent, RelayError};
use crate::ports::{DeliveryOutcome, DeliverySink, StateStore};

pub struct WebhookSink {
    client: reqwest::Client,
    store: Arc<dyn StateStore>,
}

impl WebhookSink {
    pub fn new(store: Arc<dyn StateStore>, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("building webhook http client: {e}")))?;
        Ok(Self { client, store })
    }
}

#[async_trait]
impl DeliverySink for WebhookSink {
    async fn deliver(&self, event: &ChangeEvent) -> Result<DeliveryOutcome, RelayError> {
        let Some(url) = self.store.get_hook(&event.event_name)? else {
            debug!(event = %event.event_name, "no destination registered");
            return Ok(DeliveryOutcome::NoSubscriber);
        };

        let response = self
            .client
            .post(&url)
            .json(event)
            .send()
            .await
            .map_err(|e| RelayError::Delivery {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Delivery {
                url,
                message: format!("destination returned {status}"),
            });
        }
        Ok(DeliveryOutcome::Delivered {
            url,
            status: status.as_u16(),
        })
    }
}
