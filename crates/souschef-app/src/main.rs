//! SousChef application binary - composition root.
//!
//! 1. Parse CLI and load configuration
//! 2. Open the SQLite recipe store (exit on failure)
//! 3. Build the NLU gateway and recipe source clients
//! 4. Wire the dispatcher, turn queue, and chosen chat transport
//! 5. Serve HTTP until ctrl-c

mod cli;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use souschef_api::{create_router, start_server, AppState, Backend, SlackTransport, WebSocketTransport};
use souschef_chat::{ChatTransport, Dispatcher, DispatcherConfig, SessionManager, TurnQueue};
use souschef_clients::{SpoonacularRecipeSource, WatsonNluGateway};
use souschef_core::config::{SousChefConfig, TransportKind};
use souschef_core::traits::RecipeStore;
use souschef_storage::{Database, SqliteRecipeStore};

use cli::CliArgs;

/// Expand ~ to the home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if let Some(rest) = data_dir.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(data_dir)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl-c");
        return;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing so its log level can apply.
    let config_file = args.resolve_config_path();
    let loaded = SousChefConfig::load(&config_file);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    config.apply_env_overrides();
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting SousChef v{}", env!("CARGO_PKG_VERSION"));
    match &loaded {
        Ok(_) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Err(e) => tracing::warn!(path = %config_file.display(), error = %e, "Using default configuration"),
    }

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        std::process::exit(1);
    }
    let db_path = data_dir.join("souschef.db");
    let db = match Database::new(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::error!(path = %db_path.display(), error = %e, "Failed to open recipe store");
            std::process::exit(1);
        }
    };
    let store = Arc::new(SqliteRecipeStore::new(db));
    if let Err(e) = store.init().await {
        tracing::error!(error = %e, "Recipe store failed to initialize");
        std::process::exit(1);
    }
    tracing::info!(path = %db_path.display(), "Recipe store ready");

    // Remote collaborators.
    let gateway = Arc::new(WatsonNluGateway::new(&config.nlu)?);
    let source = Arc::new(SpoonacularRecipeSource::new(&config.recipes)?);

    // Conversation core.
    let sessions = Arc::new(SessionManager::new());
    let dispatcher = Arc::new(Dispatcher::new(
        gateway,
        store,
        source,
        Arc::clone(&sessions),
        DispatcherConfig {
            workspace_id: config.nlu.workspace_id.clone(),
            favorites_limit: config.session.favorites_limit,
        },
    ));

    let idle_minutes = config.session.idle_timeout_minutes;
    if idle_minutes > 0 {
        Arc::clone(&sessions).spawn_sweeper(
            Duration::from_secs(idle_minutes * 60),
            Duration::from_secs(config.session.sweep_interval_secs.max(1)),
        );
        tracing::info!(idle_minutes, "Idle session eviction enabled");
    }

    // Transport.
    let kind = args.resolve_transport(config.transport.kind)?;
    let (transport, backend): (Arc<dyn ChatTransport>, Backend) = match kind {
        TransportKind::Websocket => {
            let ws = Arc::new(WebSocketTransport::new());
            (ws.clone(), Backend::WebSocket(ws))
        }
        TransportKind::Slack => {
            let slack = Arc::new(SlackTransport::new(&config.slack)?);
            (slack.clone(), Backend::Slack(slack))
        }
    };
    tracing::info!(transport = transport.name(), "Chat transport selected");

    let queue = TurnQueue::new(
        dispatcher,
        transport,
        Duration::from_secs(config.session.queue_idle_secs.max(1)),
    );
    let router = create_router(AppState::new(queue, backend));

    let port = args.resolve_port(config.transport.port);
    let addr = format!("{}:{}", config.transport.bind_addr, port);
    start_server(&addr, router, shutdown_signal()).await?;

    Ok(())
}
