//! SousChef chat transports on axum.
//!
//! Two interchangeable backends deliver chat turns to the turn queue: a
//! direct WebSocket endpoint and a Slack Events API webhook whose requests
//! must carry a valid Slack signature. Both expose `/health`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod slack;
pub mod state;
pub mod websocket;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use slack::SlackTransport;
pub use state::{AppState, Backend};
pub use websocket::WebSocketTransport;
