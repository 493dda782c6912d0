//! UpstreamSource port - ポーリング専用の外部 API

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::RelayError;

/// One page request: "records changed at or after `since`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub since: DateTime<Utc>,
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
}

#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Fetch one page of raw records in upstream order (possibly empty).
    ///
    /// Transport, auth, timeout and shape errors are returned as `RelayError`;
    /// the caller must not touch the cursor or the ledger when this fails.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<serde_json::Value>, RelayError>;
}
