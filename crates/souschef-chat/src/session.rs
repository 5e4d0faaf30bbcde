//! Per-user conversation sessions.
//!
//! A session is created lazily on a user's first message. Each session sits
//! behind its own async mutex; the dispatcher holds that lock for a whole
//! turn, so two turns for the same user can never interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use souschef_core::types::{ConversationContext, RecipeSummary, SearchRecord, UserRecord};

use crate::error::ChatError;

/// Context key holding the current candidate list.
pub const RECIPES_KEY: &str = "recipes";

/// Mutable conversation state for one user.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    /// Store record for this user, created by the first completed start turn.
    pub user: Option<UserRecord>,
    /// Context returned by the NLU gateway on the previous turn.
    pub context: Option<ConversationContext>,
    /// The ingredient or cuisine search whose candidates are on offer, used
    /// to attribute a later selection.
    pub active_search: Option<SearchRecord>,
    /// Set by the first start turn after a reset.
    pub conversation_started: bool,
    /// Epoch seconds of the last turn.
    pub last_message_at: i64,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user: None,
            context: None,
            active_search: None,
            conversation_started: false,
            last_message_at: Utc::now().timestamp(),
        }
    }

    /// Reset the conversation, keeping the user record.
    pub fn clear(&mut self) {
        self.context = None;
        self.active_search = None;
        self.conversation_started = false;
    }

    pub fn touch(&mut self) {
        self.last_message_at = Utc::now().timestamp();
    }

    /// Candidates most recently attached to the context.
    ///
    /// A missing or malformed list reads as empty.
    pub fn recipes(&self) -> Vec<RecipeSummary> {
        self.context
            .as_ref()
            .and_then(|ctx| ctx.get(RECIPES_KEY))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Attach a candidate list to the context so it survives the next gateway round trip.
    pub fn set_recipes(&mut self, recipes: &[RecipeSummary]) {
        let list = Value::Array(
            recipes
                .iter()
                .map(|r| serde_json::json!({ "id": r.id, "title": r.title }))
                .collect(),
        );
        self.context
            .get_or_insert_with(ConversationContext::new)
            .insert(RECIPES_KEY.to_string(), list);
    }
}

/// Maps user identity to its session.
#[derive(Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Session>>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the user's session, creating an empty one on first contact.
    pub fn get_or_create(
        &self,
        user_id: &str,
    ) -> Result<Arc<tokio::sync::Mutex<Session>>, ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::SessionLock(e.to_string()))?;
        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id, "Creating session");
                Arc::new(tokio::sync::Mutex::new(Session::new(user_id)))
            });
        Ok(Arc::clone(session))
    }

    pub fn get(&self, user_id: &str) -> Option<Arc<tokio::sync::Mutex<Session>>> {
        self.sessions
            .lock()
            .ok()
            .and_then(|s| s.get(user_id).cloned())
    }

    /// Reset conversation state, leaving the user record in place.
    pub fn clear(&self, session: &mut Session) {
        debug!(user_id = %session.user_id, "Clearing session");
        session.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions idle for longer than `max_idle`.
    ///
    /// Sessions with a turn in flight, or handed out to one about to start,
    /// are skipped.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now().timestamp() - max_idle.as_secs() as i64;
        let mut sessions = match self.sessions.lock() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Session map lock poisoned: {}", e);
                return 0;
            }
        };
        let before = sessions.len();
        sessions.retain(|_, session| {
            if Arc::strong_count(session) > 1 {
                return true;
            }
            match session.try_lock() {
                Ok(s) => s.last_message_at >= cutoff,
                Err(_) => true,
            }
        });
        before - sessions.len()
    }

    /// Periodically evict idle sessions until the returned task is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, max_idle: Duration, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = self.evict_idle(max_idle);
                if evicted > 0 {
                    info!(evicted, remaining = self.len(), "Evicted idle sessions");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use souschef_core::types::SearchKind;

    fn search() -> SearchRecord {
        SearchRecord {
            id: 1,
            kind: SearchKind::Ingredient,
            key: "egg".to_string(),
            recipes: vec![],
        }
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new("U1");
        assert_eq!(session.user_id, "U1");
        assert!(session.user.is_none());
        assert!(session.context.is_none());
        assert!(session.recipes().is_empty());
    }

    #[test]
    fn test_clear_keeps_user_record() {
        let mut session = Session::new("U1");
        session.user = Some(UserRecord {
            id: 3,
            user_id: "U1".to_string(),
        });
        session.context = Some(ConversationContext::new());
        session.active_search = Some(search());
        session.conversation_started = true;

        session.clear();

        assert!(session.user.is_some());
        assert!(session.context.is_none());
        assert!(session.active_search.is_none());
        assert!(!session.conversation_started);
    }

    #[test]
    fn test_set_and_read_recipes() {
        let mut session = Session::new("U1");
        let recipes = vec![
            RecipeSummary::new("1", "Soup"),
            RecipeSummary::new("2", "Stew"),
        ];
        session.set_recipes(&recipes);
        assert_eq!(session.recipes(), recipes);
        assert_eq!(
            session.context.as_ref().unwrap()[RECIPES_KEY][1]["title"],
            json!("Stew")
        );
    }

    #[test]
    fn test_set_recipes_keeps_other_context() {
        let mut session = Session::new("U1");
        let mut ctx = ConversationContext::new();
        ctx.insert("conversation_id".to_string(), json!("c-9"));
        session.context = Some(ctx);
        session.set_recipes(&[RecipeSummary::new("1", "Soup")]);
        assert_eq!(session.context.as_ref().unwrap()["conversation_id"], json!("c-9"));
    }

    #[test]
    fn test_malformed_recipes_read_as_empty() {
        let mut session = Session::new("U1");
        let mut ctx = ConversationContext::new();
        ctx.insert(RECIPES_KEY.to_string(), json!("not a list"));
        session.context = Some(ctx);
        assert!(session.recipes().is_empty());
    }

    #[test]
    fn test_get_or_create_reuses_session() {
        let manager = SessionManager::new();
        let a = manager.get_or_create("U1").unwrap();
        let b = manager.get_or_create("U1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        manager.get_or_create("U2").unwrap();
        assert_eq!(manager.len(), 2);
    }

    #[tokio::test]
    async fn test_evict_idle_sessions() {
        let manager = SessionManager::new();
        let stale = manager.get_or_create("stale").unwrap();
        manager.get_or_create("fresh").unwrap();
        stale.lock().await.last_message_at = Utc::now().timestamp() - 3600;
        drop(stale);

        let evicted = manager.evict_idle(Duration::from_secs(600));
        assert_eq!(evicted, 1);
        assert!(manager.get("stale").is_none());
        assert!(manager.get("fresh").is_some());
    }

    #[tokio::test]
    async fn test_evict_skips_busy_sessions() {
        let manager = SessionManager::new();
        let busy = manager.get_or_create("busy").unwrap();
        let mut guard = busy.lock().await;
        guard.last_message_at = 0;

        assert_eq!(manager.evict_idle(Duration::from_secs(1)), 0);
        drop(guard);
        drop(busy);
        assert_eq!(manager.evict_idle(Duration::from_secs(1)), 1);
    }
}
