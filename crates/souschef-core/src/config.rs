use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SousChefError};

/// Top-level configuration for SousChef.
///
/// Loaded from `~/.souschef/config.toml` by default. Each section maps to one
/// collaborator or to the conversation core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SousChefConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub nlu: NluConfig,
    #[serde(default)]
    pub recipes: RecipeApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub slack: SlackConfig,
}

impl SousChefConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SousChefConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SousChefError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Override secrets from the environment so they need not live in the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SOUSCHEF_NLU_USERNAME") {
            self.nlu.username = v;
        }
        if let Some(v) = lookup("SOUSCHEF_NLU_PASSWORD") {
            self.nlu.password = v;
        }
        if let Some(v) = lookup("SOUSCHEF_NLU_WORKSPACE_ID") {
            self.nlu.workspace_id = v;
        }
        if let Some(v) = lookup("SOUSCHEF_RECIPES_API_KEY") {
            self.recipes.api_key = v;
        }
        if let Some(v) = lookup("SOUSCHEF_SLACK_BOT_TOKEN") {
            self.slack.bot_token = v;
        }
        if let Some(v) = lookup("SOUSCHEF_SLACK_SIGNING_SECRET") {
            self.slack.signing_secret = v;
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory holding the SQLite recipe store.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.souschef/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// NLU gateway (conversation service) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NluConfig {
    /// Base URL of the conversation service.
    pub url: String,
    /// Workspace (dialog model) identifier sent with every turn.
    pub workspace_id: String,
    pub username: String,
    pub password: String,
    /// API version date passed as the `version` query parameter.
    pub version: String,
    pub timeout_secs: u64,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            url: "https://gateway.watsonplatform.net/conversation/api".to_string(),
            workspace_id: String::new(),
            username: String::new(),
            password: String::new(),
            version: "2017-05-26".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Recipe API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeApiConfig {
    pub base_url: String,
    pub api_key: String,
    /// Number of candidates requested per search.
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for RecipeApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spoonacular.com".to_string(),
            api_key: String::new(),
            max_results: 5,
            timeout_secs: 30,
        }
    }
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Evict sessions idle for longer than this. 0 keeps them forever.
    pub idle_timeout_minutes: u64,
    /// How often the idle sweeper runs.
    pub sweep_interval_secs: u64,
    /// Number of favorites listed for a user.
    pub favorites_limit: usize,
    /// A per-user turn worker retires after this many idle seconds.
    pub queue_idle_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 0,
            sweep_interval_secs: 60,
            favorites_limit: 5,
            queue_idle_secs: 300,
        }
    }
}

/// Which chat transport backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Direct WebSocket connections from a web client.
    Websocket,
    /// Slack Events API + Web API.
    Slack,
}

impl std::str::FromStr for TransportKind {
    type Err = SousChefError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(TransportKind::Websocket),
            "slack" => Ok(TransportKind::Slack),
            other => Err(SousChefError::Config(format!(
                "unknown transport '{}', expected 'websocket' or 'slack'",
                other
            ))),
        }
    }
}

/// HTTP listener and transport selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    pub bind_addr: String,
    pub port: u16,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Websocket,
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Slack bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub bot_token: String,
    /// App signing secret used to verify inbound Events API requests.
    pub signing_secret: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            signing_secret: String::new(),
            api_base: "https://slack.com/api".to_string(),
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = SousChefConfig::default();
        assert_eq!(config.general.data_dir, "~/.souschef/data");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.nlu.version, "2017-05-26");
        assert_eq!(config.recipes.max_results, 5);
        assert_eq!(config.session.favorites_limit, 5);
        assert_eq!(config.session.idle_timeout_minutes, 0);
        assert_eq!(config.transport.kind, TransportKind::Websocket);
        assert_eq!(config.transport.port, 8080);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
data_dir = "/srv/souschef"
log_level = "debug"

[nlu]
workspace_id = "ws-123"
username = "bot"
password = "secret"

[recipes]
api_key = "abc"
max_results = 3

[transport]
kind = "slack"
port = 9000
"#;
        let file = create_temp_config(content);
        let config = SousChefConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/srv/souschef");
        assert_eq!(config.nlu.workspace_id, "ws-123");
        assert_eq!(config.recipes.max_results, 3);
        assert_eq!(config.transport.kind, TransportKind::Slack);
        assert_eq!(config.transport.port, 9000);
        // Unspecified fields keep their defaults.
        assert_eq!(config.transport.bind_addr, "127.0.0.1");
        assert_eq!(config.nlu.timeout_secs, 30);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config("[general]\nlog_level = \"warn\"\n");
        let config = SousChefConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.session.sweep_interval_secs, 60);
        assert_eq!(config.slack.api_base, "https://slack.com/api");
        assert_eq!(config.slack.timeout_secs, 30);
        assert!(config.slack.signing_secret.is_empty());
    }

    #[test]
    fn test_load_invalid_transport_kind() {
        let file = create_temp_config("[transport]\nkind = \"carrier-pigeon\"\n");
        let result = SousChefConfig::load(file.path());
        assert!(matches!(result, Err(SousChefError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = SousChefConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.souschef/data");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SousChefConfig::default();
        config.nlu.workspace_id = "ws-9".to_string();
        config.save(&path).unwrap();

        let reloaded = SousChefConfig::load(&path).unwrap();
        assert_eq!(reloaded.nlu.workspace_id, "ws-9");
        assert_eq!(reloaded.transport.kind, config.transport.kind);
    }

    #[test]
    fn test_transport_kind_from_str() {
        assert_eq!("websocket".parse::<TransportKind>().unwrap(), TransportKind::Websocket);
        assert_eq!("WS".parse::<TransportKind>().unwrap(), TransportKind::Websocket);
        assert_eq!("Slack".parse::<TransportKind>().unwrap(), TransportKind::Slack);
        assert!("irc".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_overrides_replace_secrets() {
        let env: HashMap<&str, &str> = [
            ("SOUSCHEF_NLU_PASSWORD", "pw"),
            ("SOUSCHEF_RECIPES_API_KEY", "key"),
            ("SOUSCHEF_SLACK_BOT_TOKEN", "xoxb-1"),
            ("SOUSCHEF_SLACK_SIGNING_SECRET", "8f742231b10e"),
        ]
        .into_iter()
        .collect();

        let mut config = SousChefConfig::default();
        config.nlu.username = "kept".to_string();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.nlu.password, "pw");
        assert_eq!(config.nlu.username, "kept");
        assert_eq!(config.recipes.api_key, "key");
        assert_eq!(config.slack.bot_token, "xoxb-1");
        assert_eq!(config.slack.signing_secret, "8f742231b10e");
    }
}
