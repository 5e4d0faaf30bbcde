//! Greeting and small talk: relay whatever the gateway said.

use tracing::info;

use souschef_core::types::NluResponse;

use super::{ensure_user, HandlerDeps};
use crate::error::ChatError;
use crate::session::Session;

pub async fn handle(
    deps: &HandlerDeps,
    session: &mut Session,
    response: &NluResponse,
) -> Result<String, ChatError> {
    ensure_user(deps, session).await?;
    if !session.conversation_started {
        info!(user_id = %session.user_id, "Conversation started");
        session.conversation_started = true;
    }
    Ok(response.output.join("\n"))
}
