//! Status endpoint: last cycle outcome and counters.

use axum::Json;
use axum::extract::State;

use super::AppState;
use crate::app::StatusSnapshot;

pub async fn status_handler(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.status().snapshot())
}
