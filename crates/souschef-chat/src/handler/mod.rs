//! Turn handlers, one per [`TurnMode`](crate::mode::TurnMode).
//!
//! Each handler mutates the session it is given and returns the reply
//! text. Handlers never clear the session on failure; the dispatcher does.

pub mod favorites;
pub mod search;
pub mod selection;
pub mod start;

use std::sync::Arc;

use tracing::debug;

use souschef_core::traits::{RecipeSource, RecipeStore};
use souschef_core::types::UserRecord;

use crate::error::ChatError;
use crate::keylock::KeyLocks;
use crate::session::Session;

/// What the handlers read from and write through.
pub struct HandlerDeps {
    pub store: Arc<dyn RecipeStore>,
    pub source: Arc<dyn RecipeSource>,
    /// Serializes cache fills per search key and recipe id.
    pub key_locks: KeyLocks,
    pub favorites_limit: usize,
}

impl HandlerDeps {
    pub fn new(store: Arc<dyn RecipeStore>, source: Arc<dyn RecipeSource>, favorites_limit: usize) -> Self {
        Self {
            store,
            source,
            key_locks: KeyLocks::new(),
            favorites_limit,
        }
    }
}

/// The session's user record, creating it in the store if the user skipped
/// straight past the greeting.
pub(crate) async fn ensure_user(deps: &HandlerDeps, session: &mut Session) -> Result<UserRecord, ChatError> {
    if let Some(user) = &session.user {
        return Ok(user.clone());
    }
    let user = deps.store.add_user(&session.user_id).await?;
    debug!(user_id = %session.user_id, record_id = user.id, "Attached user record");
    session.user = Some(user.clone());
    Ok(user)
}
