//! Configuration read from the environment.
//!
//! Missing upstream credentials are not a startup failure: the HTTP surface
//! still comes up, and every polling cycle fails with a configuration error
//! until they are provided.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::ResourceSpec;

const DEFAULT_BASE_URL: &str = "https://{subdomain}.freshdesk.com/api/v2";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_PATH: &str = "relay.db";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_MAX_PAGES: u32 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// First-run cursor is `now - 5 minutes`.
const DEFAULT_CURSOR_LOOKBACK_SECS: u64 = 5 * 60;

/// Subdomain + API key. Both are required to poll.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamCredentials {
    pub subdomain: String,
    pub api_key: String,
}

impl std::fmt::Debug for UpstreamCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamCredentials")
            .field("subdomain", &self.subdomain)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Whether a cycle reads only page one or walks pages until exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    FirstPage,
    /// Stop at the first short page, or after `max_pages`.
    AllPages { max_pages: u32 },
}

impl PaginationMode {
    pub fn max_pages(&self) -> u32 {
        match self {
            PaginationMode::FirstPage => 1,
            PaginationMode::AllPages { max_pages } => (*max_pages).max(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub credentials: Option<UpstreamCredentials>,
    /// May contain `{subdomain}`.
    pub base_url_template: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub poll_interval: Duration,
    pub page_size: u32,
    pub pagination: PaginationMode,
    pub request_timeout: Duration,
    pub cursor_lookback: Duration,
    pub resource: ResourceSpec,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            base_url_template: DEFAULT_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            pagination: PaginationMode::AllPages {
                max_pages: DEFAULT_MAX_PAGES,
            },
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cursor_lookback: Duration::from_secs(DEFAULT_CURSOR_LOOKBACK_SECS),
            resource: ResourceSpec::default(),
        }
    }
}

impl RelayConfig {
    /// Reads `RELAY_*` variables and `PORT`. Unparseable numbers fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str| non_empty(key).and_then(|v| v.trim().parse::<u64>().ok());

        let defaults = Self::default();

        let credentials = match (non_empty("RELAY_SUBDOMAIN"), non_empty("RELAY_API_KEY")) {
            (Some(subdomain), Some(api_key)) => Some(UpstreamCredentials {
                subdomain: subdomain.trim().to_string(),
                api_key: api_key.trim().to_string(),
            }),
            _ => None,
        };

        let max_pages = number("RELAY_MAX_PAGES")
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(DEFAULT_MAX_PAGES);
        let pagination = match non_empty("RELAY_PAGINATION").as_deref().map(str::trim) {
            Some("first-page") => PaginationMode::FirstPage,
            _ => PaginationMode::AllPages { max_pages },
        };

        Self {
            credentials,
            base_url_template: non_empty("RELAY_API_BASE_URL")
                .unwrap_or(defaults.base_url_template),
            port: number("PORT")
                .and_then(|n| u16::try_from(n).ok())
                .unwrap_or(defaults.port),
            db_path: non_empty("RELAY_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            poll_interval: number("RELAY_POLL_INTERVAL_SECS")
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            page_size: number("RELAY_PAGE_SIZE")
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.page_size),
            pagination,
            request_timeout: number("RELAY_REQUEST_TIMEOUT_SECS")
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            cursor_lookback: defaults.cursor_lookback,
            resource: defaults.resource,
        }
    }
}
