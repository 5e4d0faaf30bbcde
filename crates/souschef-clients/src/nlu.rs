//! Conversation service client.
//!
//! Speaks the v1 workspace `message` API: one POST per turn carrying the
//! user's text and the context returned by the previous turn.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use souschef_core::config::NluConfig;
use souschef_core::error::{Result, SousChefError};
use souschef_core::traits::NluGateway;
use souschef_core::types::{ConversationContext, NluEntity, NluRequest, NluResponse};

#[derive(Serialize)]
struct MessageRequest<'a> {
    input: MessageInput<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a ConversationContext>,
}

#[derive(Serialize)]
struct MessageInput<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    context: ConversationContext,
    #[serde(default)]
    entities: Vec<NluEntity>,
    #[serde(default)]
    output: MessageOutput,
}

#[derive(Deserialize, Default)]
struct MessageOutput {
    #[serde(default)]
    text: Vec<String>,
}

/// NLU gateway backed by a Watson-style conversation workspace.
pub struct WatsonNluGateway {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    version: String,
}

impl WatsonNluGateway {
    pub fn new(config: &NluConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SousChefError::Config(format!("Failed to build NLU client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            version: config.version.clone(),
        })
    }

    fn message_url(&self, workspace_id: &str) -> String {
        format!(
            "{}/v1/workspaces/{}/message",
            self.base_url, workspace_id
        )
    }
}

#[async_trait]
impl NluGateway for WatsonNluGateway {
    async fn message(&self, request: NluRequest) -> Result<NluResponse> {
        let body = MessageRequest {
            input: MessageInput {
                text: &request.text,
            },
            context: request.context.as_ref(),
        };

        let response = self
            .client
            .post(self.message_url(&request.workspace_id))
            .query(&[("version", self.version.as_str())])
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| SousChefError::Gateway(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SousChefError::Gateway(format!(
                "conversation service returned {}: {}",
                status, text
            )));
        }

        let parsed: MessageResponse = response
            .json()
            .await
            .map_err(|e| SousChefError::Gateway(format!("invalid response: {}", e)))?;

        debug!(
            entities = parsed.entities.len(),
            lines = parsed.output.text.len(),
            "NLU turn complete"
        );

        Ok(NluResponse {
            context: parsed.context,
            entities: parsed.entities,
            output: parsed.output.text,
        })
    }
}
