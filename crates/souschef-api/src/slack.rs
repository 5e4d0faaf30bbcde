//! Slack backend: Events API webhook in, `chat.postMessage` out.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use souschef_chat::{ChatTransport, IncomingMessage};
use souschef_core::config::SlackConfig;
use souschef_core::error::{Result, SousChefError};

/// Outer Events API payload.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEnvelope {
    UrlVerification { challenge: String },
    EventCallback { event: SlackEvent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
pub struct SlackEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: Option<String>,
    pub channel: Option<String>,
    /// `im` for direct messages; channel posts carry `channel` or `group`.
    pub channel_type: Option<String>,
    pub text: Option<String>,
    pub bot_id: Option<String>,
    pub subtype: Option<String>,
}

impl SlackEvent {
    /// The chat message carried by this event, if it came from a person.
    ///
    /// In channels the bot answers `app_mention` events only. Slack also
    /// delivers a `message` event for the same post, so plain `message`
    /// events count only in direct messages. Bot posts (including our own
    /// replies) and subtyped messages such as edits are ignored.
    pub fn to_incoming(&self) -> Option<IncomingMessage> {
        let accepted = match self.kind.as_str() {
            "app_mention" => true,
            "message" => self.channel_type.as_deref() == Some("im"),
            _ => false,
        };
        if !accepted {
            return None;
        }
        if self.bot_id.is_some() || self.subtype.is_some() {
            return None;
        }
        let user = self.user.as_ref()?;
        let channel = self.channel.as_ref()?;
        let text = strip_mentions(self.text.as_deref().unwrap_or_default());
        Some(IncomingMessage::new(user.clone(), channel.clone(), text))
    }
}

/// Drop `<@U123>` mention tokens so the gateway sees only what was said.
pub fn strip_mentions(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !(word.starts_with("<@") && word.ends_with('>')))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts replies into Slack channels as the bot user.
pub struct SlackTransport {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    signing_secret: String,
}

impl SlackTransport {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        if config.bot_token.is_empty() {
            return Err(SousChefError::Config(
                "slack.bot_token is required for the slack transport".to_string(),
            ));
        }
        if config.signing_secret.is_empty() {
            return Err(SousChefError::Config(
                "slack.signing_secret is required for the slack transport".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SousChefError::Config(format!("Failed to build Slack client: {}", e)))?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            signing_secret: config.signing_secret.clone(),
        })
    }

    /// Secret that inbound webhook requests are signed with.
    pub fn signing_secret(&self) -> &str {
        &self.signing_secret
    }
}

#[async_trait]
impl ChatTransport for SlackTransport {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send_text(&self, address: &str, text: &str) -> Result<()> {
        let url = format!("{}/chat.postMessage", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&PostMessage {
                channel: address,
                text,
            })
            .send()
            .await
            .map_err(|e| SousChefError::Transport(format!("chat.postMessage failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SousChefError::Transport(format!(
                "chat.postMessage returned {}",
                status
            )));
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| SousChefError::Transport(format!("Invalid chat.postMessage body: {}", e)))?;
        if !body.ok {
            return Err(SousChefError::Transport(format!(
                "chat.postMessage rejected: {}",
                body.error.unwrap_or_else(|| "unknown".to_string())
            )));
        }

        debug!(channel = address, "Posted reply to Slack");
        Ok(())
    }
}
