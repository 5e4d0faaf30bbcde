//! List the user's most requested recipes.

use tracing::debug;

use super::{ensure_user, HandlerDeps};
use crate::error::ChatError;
use crate::response::{format_recipe_list, MAX_CHOICES};
use crate::session::Session;

pub async fn handle(deps: &HandlerDeps, session: &mut Session) -> Result<String, ChatError> {
    let user = ensure_user(deps, session).await?;
    let limit = deps.favorites_limit.min(MAX_CHOICES);
    let favorites = deps.store.find_favorite_recipes_for_user(&user, limit).await?;
    debug!(user_id = %session.user_id, count = favorites.len(), "Loaded favorites");

    session.set_recipes(&favorites);
    // Favorites carry no search to attribute a selection to.
    session.active_search = None;
    Ok(format_recipe_list(&favorites))
}
