//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use souschef_chat::TurnQueue;

use crate::slack::SlackTransport;
use crate::websocket::WebSocketTransport;

/// The transport backend chosen at startup.
#[derive(Clone)]
pub enum Backend {
    WebSocket(Arc<WebSocketTransport>),
    Slack(Arc<SlackTransport>),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::WebSocket(_) => "websocket",
            Backend::Slack(_) => "slack",
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Where inbound chat messages are handed off.
    pub queue: TurnQueue,
    pub backend: Backend,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(queue: TurnQueue, backend: Backend) -> Self {
        Self {
            queue,
            backend,
            start_time: Instant::now(),
        }
    }
}
