//! HTTP surface (axum).
//!
//! # Endpoints
//!
//! - `POST /hooks` - register (or replace) the destination URL for an event
//! - `GET /health` - liveness, always 200
//! - `GET /status` - last poll cycle outcome and counters

use std::sync::Arc;

use tower_http::trace::TraceLayer;

use crate::app::StatusBoard;
use crate::ports::StateStore;

pub mod health;
pub mod hooks;
pub mod status;

pub use health::health_handler;
pub use hooks::register_hook_handler;
pub use status::status_handler;

/// Shared state passed to handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn StateStore>,
    status: StatusBoard,
}

impl AppState {
    pub fn new(store: Arc<dyn StateStore>, status: StatusBoard) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { store, status }),
        }
    }

    pub fn store(&self) -> &dyn StateStore {
        self.inner.store.as_ref()
    }

    pub fn status(&self) -> &StatusBoard {
        &self.inner.status
    }
}

pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/hooks", post(register_hook_handler))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
