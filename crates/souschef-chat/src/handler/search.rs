//! Ingredient and cuisine searches, read through the store.

use tracing::{debug, info};

use souschef_core::types::SearchKind;

use super::{ensure_user, HandlerDeps};
use crate::error::ChatError;
use crate::response::{format_recipe_list, MAX_CHOICES};
use crate::session::Session;

/// Normalized form under which a search is stored.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub async fn handle(
    deps: &HandlerDeps,
    session: &mut Session,
    kind: SearchKind,
    raw_key: &str,
) -> Result<String, ChatError> {
    let user = ensure_user(deps, session).await?;
    let key = normalize_key(raw_key);

    let search = {
        let _fill = deps.key_locks.lock(&format!("{}:{}", kind, key)).await?;
        match deps.store.find_search(kind, &key).await? {
            Some(existing) => {
                debug!(%kind, key = %key, search_id = existing.id, "Search cache hit");
                deps.store
                    .record_search_request_for_user(&existing, &user)
                    .await?;
                existing
            }
            None => {
                let mut found = deps.source.find(kind, &key).await?;
                found.truncate(MAX_CHOICES);
                info!(%kind, key = %key, count = found.len(), "Fetched recipes from source");
                deps.store.add_search(kind, &key, &found, &user).await?
            }
        }
    };

    session.set_recipes(&search.recipes);
    let reply = format_recipe_list(&search.recipes);
    session.active_search = Some(search);
    Ok(reply)
}
