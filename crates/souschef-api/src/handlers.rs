//! Route handler functions.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::ApiError;
use crate::slack::SlackEnvelope;
use crate::state::{AppState, Backend};
use crate::websocket::serve_socket;

/// Header Slack sets when redelivering an event it thinks we missed.
const SLACK_RETRY_HEADER: &str = "x-slack-retry-num";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub transport: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        transport: state.backend.name().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.queue.dispatcher().sessions().len(),
    })
}

/// GET /ws - upgrade to a chat socket.
pub async fn websocket(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let transport = match &state.backend {
        Backend::WebSocket(transport) => transport.clone(),
        Backend::Slack(_) => {
            return Err(ApiError::NotFound("websocket transport is not enabled".into()))
        }
    };
    let queue = state.queue.clone();
    Ok(ws.on_upgrade(move |socket| serve_socket(socket, transport, queue)))
}

/// POST /slack/events - Events API webhook.
///
/// Acknowledges immediately; the reply is posted once the turn completes.
pub async fn slack_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(envelope): Json<SlackEnvelope>,
) -> Result<Response, ApiError> {
    match envelope {
        SlackEnvelope::UrlVerification { challenge } => {
            Ok(Json(json!({ "challenge": challenge })).into_response())
        }
        SlackEnvelope::EventCallback { event } => {
            if headers.contains_key(SLACK_RETRY_HEADER) {
                debug!("Skipping redelivered Slack event");
                return Ok(Json(json!({ "ok": true })).into_response());
            }
            if let Some(message) = event.to_incoming() {
                state.queue.enqueue(message)?;
            }
            Ok(Json(json!({ "ok": true })).into_response())
        }
        SlackEnvelope::Other => Ok(Json(json!({ "ok": true })).into_response()),
    }
}
