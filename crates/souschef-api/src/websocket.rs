//! Direct WebSocket backend.
//!
//! Each connection gets a fresh client id that serves as both the session
//! key and the reply address. Replies reach the socket task through a
//! per-client channel held in the registry.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use souschef_chat::{ChatTransport, IncomingMessage, TurnQueue};
use souschef_core::error::{Result, SousChefError};

/// Frames a client may send.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    Msg { text: String },
    Ping,
}

/// Frames the server sends.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame<'a> {
    Msg { text: &'a str },
    Pong,
}

/// Interpret a text frame.
///
/// Only JSON objects are control frames; an object of unknown shape is
/// ignored. Anything else, including bare JSON scalars such as `3`, is the
/// user's text.
pub fn parse_frame(raw: &str) -> Option<ClientFrame> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value @ serde_json::Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => Some(ClientFrame::Msg {
            text: raw.to_string(),
        }),
    }
}

/// Registry of connected socket clients.
#[derive(Default)]
pub struct WebSocketTransport {
    clients: Mutex<HashMap<String, mpsc::UnboundedSender<String>>>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client and return the receiving end of its outbound channel.
    pub fn register(&self, client_id: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut clients) = self.clients.lock() {
            clients.insert(client_id.to_string(), tx);
        }
        rx
    }

    pub fn unregister(&self, client_id: &str) {
        if let Ok(mut clients) = self.clients.lock() {
            clients.remove(client_id);
        }
    }

    pub fn connected(&self) -> usize {
        self.clients.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatTransport for WebSocketTransport {
    fn name(&self) -> &str {
        "websocket"
    }

    async fn send_text(&self, address: &str, text: &str) -> Result<()> {
        let frame = serde_json::to_string(&ServerFrame::Msg { text })?;
        let clients = self
            .clients
            .lock()
            .map_err(|e| SousChefError::Transport(format!("client registry poisoned: {}", e)))?;
        let tx = clients
            .get(address)
            .ok_or_else(|| SousChefError::Transport(format!("client {} is not connected", address)))?;
        tx.send(frame)
            .map_err(|_| SousChefError::Transport(format!("client {} disconnected", address)))
    }
}

/// Pump one upgraded connection until either side closes.
pub async fn serve_socket(mut socket: WebSocket, transport: std::sync::Arc<WebSocketTransport>, queue: TurnQueue) {
    let client_id = Uuid::new_v4().to_string();
    let mut outbound = transport.register(&client_id);
    info!(client_id = %client_id, "WebSocket client connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(raw))) => match parse_frame(raw.as_str()) {
                    Some(ClientFrame::Ping) => {
                        let pong = match serde_json::to_string(&ServerFrame::Pong) {
                            Ok(pong) => pong,
                            Err(_) => continue,
                        };
                        if socket.send(Message::Text(pong.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(ClientFrame::Msg { text }) => {
                        let message = IncomingMessage::new(client_id.clone(), client_id.clone(), text);
                        if let Err(e) = queue.enqueue(message) {
                            warn!(client_id = %client_id, error = %e, "Failed to queue message");
                        }
                    }
                    None => debug!(client_id = %client_id, "Ignoring unrecognized frame"),
                },
                // Protocol pings are answered by the socket layer itself.
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Binary(_))) => {}
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(client_id = %client_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            reply = outbound.recv() => match reply {
                Some(frame) => {
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    transport.unregister(&client_id);
    info!(client_id = %client_id, "WebSocket client disconnected");
}
