//! WebhookRegistration - 配送先の登録
//!
//! event 名ごとに URL は高々ひとつ（後勝ち）。

use serde::Deserialize;
use url::Url;

use super::errors::RelayError;

/// Raw registration request body as received.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub event: Option<String>,
    pub url: Option<String>,
}

/// A validated `{ event, url }` pair, ready to be upserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRegistration {
    event: String,
    url: Url,
}

impl WebhookRegistration {
    /// Validate an event name and destination URL.
    ///
    /// Only absolute `http`/`https` URLs are accepted.
    pub fn new(event: &str, url: &str) -> Result<Self, RelayError> {
        let event = event.trim();
        if event.is_empty() {
            return Err(RelayError::Validation("event must not be empty".into()));
        }
        let parsed = Url::parse(url.trim())
            .map_err(|e| RelayError::Validation(format!("url is not valid: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RelayError::Validation(format!(
                "url scheme must be http or https, got {}",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none() {
            return Err(RelayError::Validation("url must have a host".into()));
        }
        Ok(Self {
            event: event.to_string(),
            url: parsed,
        })
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl TryFrom<RegistrationRequest> for WebhookRegistration {
    type Error = RelayError;

    fn try_from(req: RegistrationRequest) -> Result<Self, Self::Error> {
        let event = req
            .event
            .ok_or_else(|| RelayError::Validation("event is required".into()))?;
        let url = req
            .url
            .ok_or_else(|| RelayError::Validation("url is required".into()))?;
        Self::new(&event, &url)
    }
}
