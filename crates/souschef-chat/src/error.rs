//! Error types for the conversation core.

use souschef_core::error::SousChefError;

/// Why a turn failed.
///
/// Every variant is caught at the dispatcher boundary and turned into the
/// fallback reply. An out-of-range selection is not an error; the selection
/// handler answers it directly.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("NLU gateway error: {0}")]
    Gateway(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("recipe source error: {0}")]
    RecipeSource(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("session lock poisoned: {0}")]
    SessionLock(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Gateway(_) => "gateway",
            ChatError::Store(_) => "store",
            ChatError::RecipeSource(_) => "recipe_source",
            ChatError::Transport(_) => "transport",
            ChatError::SessionLock(_) => "session_lock",
            ChatError::Internal(_) => "internal",
        }
    }
}

impl From<SousChefError> for ChatError {
    fn from(err: SousChefError) -> Self {
        match err {
            SousChefError::Gateway(msg) => ChatError::Gateway(msg),
            SousChefError::Storage(msg) | SousChefError::Serialization(msg) => {
                ChatError::Store(msg)
            }
            SousChefError::RecipeSource(msg) => ChatError::RecipeSource(msg),
            SousChefError::Transport(msg) => ChatError::Transport(msg),
            other => ChatError::Internal(other.to_string()),
        }
    }
}
