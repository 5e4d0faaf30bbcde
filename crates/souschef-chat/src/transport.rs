//! The chat transport capability.
//!
//! Backends live in `souschef-api`; the dispatcher and turn queue only see
//! this trait.

use async_trait::async_trait;

/// One inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Identity that keys the session.
    pub sender: String,
    /// Where the reply is delivered (a socket client id, a channel).
    pub address: String,
    pub text: String,
}

impl IncomingMessage {
    pub fn new(sender: impl Into<String>, address: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            address: address.into(),
            text: text.into(),
        }
    }
}

/// Delivers reply text to a user.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn name(&self) -> &str;

    async fn send_text(&self, address: &str, text: &str) -> souschef_core::Result<()>;
}
