//! CLI argument definitions for the SousChef binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use souschef_core::config::TransportKind;
use souschef_core::error::Result;

/// SousChef: a recipe chatbot for Slack or the browser.
#[derive(Parser, Debug)]
#[command(name = "souschef", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP listen port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Data directory holding the SQLite database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Chat transport: websocket or slack.
    #[arg(short = 't', long = "transport")]
    pub transport: Option<String>,
}

impl CliArgs {
    /// Priority: --config flag > SOUSCHEF_CONFIG env var > ~/.souschef/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SOUSCHEF_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --port flag > SOUSCHEF_PORT env var > config file value > 8080.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("SOUSCHEF_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        8080
    }

    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    /// Priority: --transport flag > config file value.
    pub fn resolve_transport(&self, config_kind: TransportKind) -> Result<TransportKind> {
        match &self.transport {
            Some(raw) => raw.parse(),
            None => Ok(config_kind),
        }
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".souschef").join("config.toml");
    }
    PathBuf::from("config.toml")
}
