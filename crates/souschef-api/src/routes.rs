//! Router setup and server startup.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use souschef_core::error::{Result, SousChefError};

use crate::handlers;
use crate::state::{AppState, Backend};

/// Build the router for the backend held in `state`.
///
/// Only the active backend's inbound route is mounted.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new().route("/health", get(handlers::health));

    let router = match state.backend {
        Backend::WebSocket(_) => router.route("/ws", get(handlers::websocket)),
        Backend::Slack(_) => {
            // Signature checks guard the webhook only; /health stays open.
            let events = Router::new()
                .route("/slack/events", post(handlers::slack_events))
                .route_layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    crate::auth::verify_slack_signature,
                ));
            router.merge(events)
        }
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Serve `router` on `addr` until `shutdown` resolves.
pub async fn start_server<F>(addr: &str, router: Router, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SousChefError::Transport(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SousChefError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}
