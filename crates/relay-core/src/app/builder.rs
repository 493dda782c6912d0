//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! 依存オブジェクトは起動時に一度だけ作り、プロセスの寿命の間共有する。
//! 差し替えなかった port は設定からデフォルト実装を作る:
//! SqliteStateStore / HttpUpstream / WebhookSink / SystemClock。
//!
//! # Fail-fast 設計
//! - base URL テンプレートが URL として組み立てられなければ BuildError
//! - 認証情報の欠落はエラーにしない（サイクルごとに失敗として記録される）

use std::sync::Arc;

use url::Url;

use super::cycle::{CycleSettings, PollCycle};
use super::engine::DeliveryEngine;
use super::scheduler::Scheduler;
use super::status::StatusBoard;
use crate::config::RelayConfig;
use crate::domain::RelayError;
use crate::impls::{HttpUpstream, SqliteStateStore, WebhookSink};
use crate::ports::{Clock, DeliverySink, StateStore, SystemClock, UlidGenerator, UpstreamSource};
use crate::server::{AppState, build_router};

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("opening state store at {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: RelayError,
    },

    #[error("building http adapters: {0}")]
    Http(#[source] RelayError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub struct AppBuilder {
    config: RelayConfig,
    store: Option<Arc<dyn StateStore>>,
    upstream: Option<Arc<dyn UpstreamSource>>,
    sink: Option<Arc<dyn DeliverySink>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AppBuilder {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            store: None,
            upstream: None,
            sink: None,
            clock: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn upstream(mut self, upstream: Arc<dyn UpstreamSource>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DeliverySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        let config = self.config;
        validate_base_url(&config.base_url_template)?;
        let cursor_lookback = chrono::Duration::from_std(config.cursor_lookback)
            .map_err(|e| BuildError::InvalidConfig(format!("cursor lookback: {e}")))?;

        let store: Arc<dyn StateStore> = match self.store {
            Some(store) => store,
            None => {
                let opened =
                    SqliteStateStore::open(&config.db_path).map_err(|source| BuildError::Store {
                        path: config.db_path.display().to_string(),
                        source,
                    })?;
                Arc::new(opened)
            }
        };
        let upstream: Arc<dyn UpstreamSource> = match self.upstream {
            Some(upstream) => upstream,
            None => Arc::new(
                HttpUpstream::new(
                    config.base_url_template.clone(),
                    config.resource.collection.clone(),
                    config.credentials.clone(),
                    config.request_timeout,
                )
                .map_err(BuildError::Http)?,
            ),
        };
        let sink: Arc<dyn DeliverySink> = match self.sink {
            Some(sink) => sink,
            None => Arc::new(
                WebhookSink::new(store.clone(), config.request_timeout).map_err(BuildError::Http)?,
            ),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let engine = DeliveryEngine::new(
            store.clone(),
            sink,
            clock.clone(),
            config.resource.clone(),
        );
        let cycle = PollCycle::new(
            upstream,
            engine,
            store.clone(),
            clock.clone(),
            Arc::new(UlidGenerator::new(clock.clone())),
            CycleSettings {
                resource: config.resource.clone(),
                page_size: config.page_size,
                pagination: config.pagination,
                cursor_lookback,
            },
        );

        Ok(App {
            config,
            store,
            clock,
            cycle: Arc::new(cycle),
            status: StatusBoard::new(),
        })
    }
}

fn validate_base_url(template: &str) -> Result<(), BuildError> {
    let candidate = template.replace("{subdomain}", "placeholder");
    let url = Url::parse(&candidate)
        .map_err(|e| BuildError::InvalidConfig(format!("base url {template:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BuildError::InvalidConfig(format!(
            "base url {template:?} must be http or https"
        )));
    }
    Ok(())
}

/// Wired application: one store, one cycle, one status board.
pub struct App {
    pub config: RelayConfig,
    pub store: Arc<dyn StateStore>,
    pub clock: Arc<dyn Clock>,
    pub cycle: Arc<PollCycle>,
    pub status: StatusBoard,
}

impl App {
    pub fn spawn_scheduler(&self) -> Scheduler {
        Scheduler::spawn(
            self.cycle.clone(),
            self.config.poll_interval,
            self.clock.clone(),
            self.status.clone(),
        )
    }

    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(self.store.clone(), self.status.clone()))
    }
}
