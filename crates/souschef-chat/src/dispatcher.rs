//! Turn dispatcher: gateway round trip, classification, handler routing.

use std::sync::Arc;

use tracing::{debug, warn};

use souschef_core::traits::{NluGateway, RecipeSource, RecipeStore};
use souschef_core::types::{NluRequest, SearchKind};

use crate::error::ChatError;
use crate::handler::{self, HandlerDeps};
use crate::mode::TurnMode;
use crate::response::FALLBACK_MESSAGE;
use crate::session::{Session, SessionManager};
use crate::transport::{ChatTransport, IncomingMessage};

/// Settings the dispatcher needs per turn.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Workspace (model) id sent with every gateway request.
    pub workspace_id: String,
    pub favorites_limit: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workspace_id: String::new(),
            favorites_limit: 5,
        }
    }
}

/// Drives one chat turn from raw text to reply text.
pub struct Dispatcher {
    gateway: Arc<dyn NluGateway>,
    deps: HandlerDeps,
    sessions: Arc<SessionManager>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        gateway: Arc<dyn NluGateway>,
        store: Arc<dyn RecipeStore>,
        source: Arc<dyn RecipeSource>,
        sessions: Arc<SessionManager>,
        config: DispatcherConfig,
    ) -> Self {
        let deps = HandlerDeps::new(store, source, config.favorites_limit);
        Self {
            gateway,
            deps,
            sessions,
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Run one turn for `user_id` and return the reply.
    ///
    /// Never fails: any error clears the session and yields the fallback text.
    pub async fn handle_turn(&self, user_id: &str, text: &str) -> String {
        let session = match self.sessions.get_or_create(user_id) {
            Ok(session) => session,
            Err(e) => {
                warn!(user_id, kind = e.kind(), error = %e, "Turn failed before session lock");
                return FALLBACK_MESSAGE.to_string();
            }
        };

        let mut session = session.lock().await;
        session.touch();

        match self.run_turn(&mut session, text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(user_id, kind = e.kind(), error = %e, "Turn failed, resetting conversation");
                self.sessions.clear(&mut session);
                FALLBACK_MESSAGE.to_string()
            }
        }
    }

    /// Run one turn and deliver the reply to the message's address.
    pub async fn dispatch(
        &self,
        incoming: &IncomingMessage,
        transport: &dyn ChatTransport,
    ) -> Result<(), ChatError> {
        let reply = self.handle_turn(&incoming.sender, &incoming.text).await;
        transport
            .send_text(&incoming.address, &reply)
            .await
            .map_err(|e| ChatError::Transport(format!("{} send failed: {}", transport.name(), e)))
    }

    async fn run_turn(&self, session: &mut Session, text: &str) -> Result<String, ChatError> {
        let request = NluRequest {
            text: text.to_string(),
            context: session.context.clone(),
            workspace_id: self.config.workspace_id.clone(),
        };
        let response = self.gateway.message(request).await?;
        session.context = Some(response.context.clone());

        let mode = TurnMode::classify(&response, text);
        debug!(user_id = %session.user_id, mode = mode.name(), "Classified turn");

        match mode {
            TurnMode::Favorites => handler::favorites::handle(&self.deps, session).await,
            TurnMode::Ingredients(key) => {
                handler::search::handle(&self.deps, session, SearchKind::Ingredient, &key).await
            }
            TurnMode::Cuisine(key) => {
                handler::search::handle(&self.deps, session, SearchKind::Cuisine, &key).await
            }
            TurnMode::Selection(choice) => {
                handler::selection::handle(&self.deps, session, choice).await
            }
            TurnMode::Start => handler::start::handle(&self.deps, session, &response).await,
        }
    }
}
