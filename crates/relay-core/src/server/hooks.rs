//! Webhook registration endpoint.
//!
//! `POST /hooks` with `{ "event": "...", "url": "..." }` upserts the
//! destination for that event. Invalid input is a 400 and the store is not
//! touched.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::AppState;
use crate::domain::{RegistrationRequest, RelayError, WebhookRegistration};

pub async fn register_hook_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let registration = match parse_registration(&body) {
        Ok(registration) => registration,
        Err(err) => {
            warn!(error = %err, "rejected hook registration");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": err.to_string() })),
            );
        }
    };

    match state
        .store()
        .set_hook(registration.event(), registration.url())
    {
        Ok(()) => {
            info!(event = registration.event(), url = registration.url(), "hook registered");
            (StatusCode::OK, Json(json!({ "ok": true })))
        }
        Err(err) => {
            error!(error = %err, "failed to persist hook registration");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "failed to store registration" })),
            )
        }
    }
}

fn parse_registration(body: &[u8]) -> Result<WebhookRegistration, RelayError> {
    let request: RegistrationRequest = serde_json::from_slice(body)
        .map_err(|e| RelayError::Validation(format!("body is not a valid registration: {e}")))?;
    WebhookRegistration::try_from(request)
}
