//! Test doubles for the ports.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::timestamp::parse_timestamp;
use crate::domain::{ChangeEvent, RelayError};
use crate::ports::{DeliveryOutcome, DeliverySink, PageRequest, StateStore, UpstreamSource};

/// Serves a fixed data set, filtered by `updated_at >= since` and paginated.
#[derive(Default)]
pub struct DatasetUpstream {
    records: Mutex<Vec<Value>>,
    requests: Mutex<Vec<PageRequest>>,
    fail_next: Mutex<Option<RelayError>>,
}

impl DatasetUpstream {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn push(&self, record: Value) {
        self.records.lock().unwrap().push(record);
    }

    pub fn fail_next(&self, err: RelayError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamSource for DatasetUpstream {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Value>, RelayError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        let matching: Vec<Value> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.get("updated_at")
                    .and_then(Value::as_str)
                    .and_then(parse_timestamp)
                    .is_none_or(|ts| ts >= request.since)
            })
            .cloned()
            .collect();
        let per_page = request.per_page as usize;
        let skip = (request.page.saturating_sub(1) as usize) * per_page;
        Ok(matching.into_iter().skip(skip).take(per_page).collect())
    }
}

/// Records every event it is asked to deliver.
///
/// With a store attached, events without a registered hook are reported as
/// `NoSubscriber` and not recorded.
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<ChangeEvent>>,
    fail_ids: Mutex<HashSet<String>>,
    store: Option<Arc<dyn StateStore>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<dyn StateStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Make deliveries of the record with this `id` fail.
    pub fn fail_for_id(&self, id: &str) {
        self.fail_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn heal(&self) {
        self.fail_ids.lock().unwrap().clear();
    }

    pub fn delivered(&self) -> Vec<ChangeEvent> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_ids(&self) -> Vec<String> {
        self.delivered()
            .iter()
            .map(|e| record_id(&e.data))
            .collect()
    }
}

fn record_id(data: &Value) -> String {
    match data.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn deliver(&self, event: &ChangeEvent) -> Result<DeliveryOutcome, RelayError> {
        if let Some(store) = &self.store
            && store.get_hook(&event.event_name)?.is_none()
        {
            return Ok(DeliveryOutcome::NoSubscriber);
        }
        if self.fail_ids.lock().unwrap().contains(&record_id(&event.data)) {
            return Err(RelayError::Delivery {
                url: "https://hooks.test/in".into(),
                message: "destination returned 500 Internal Server Error".into(),
            });
        }
        self.delivered.lock().unwrap().push(event.clone());
        Ok(DeliveryOutcome::Delivered {
            url: "https://hooks.test/in".into(),
            status: 200,
        })
    }
}
