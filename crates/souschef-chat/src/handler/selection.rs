//! Turn a numbered choice into recipe instructions.

use tracing::{debug, info};

use super::{ensure_user, HandlerDeps};
use crate::error::ChatError;
use crate::response::{format_instructions, INVALID_SELECTION_MESSAGE, MAX_CHOICES};
use crate::session::Session;

/// Answer a selection. The session is cleared on every path that returns `Ok`.
pub async fn handle(
    deps: &HandlerDeps,
    session: &mut Session,
    selection: i64,
) -> Result<String, ChatError> {
    let candidates = session.recipes();
    let index = match choice_index(selection, candidates.len()) {
        Some(index) => index,
        None => {
            debug!(user_id = %session.user_id, selection, offered = candidates.len(), "Invalid selection");
            session.clear();
            return Ok(INVALID_SELECTION_MESSAGE.to_string());
        }
    };

    let user = ensure_user(deps, session).await?;
    let recipe_id = candidates[index].id.clone();
    let search = session.active_search.clone();

    let instructions = {
        let _fill = deps.key_locks.lock(&format!("recipe:{}", recipe_id)).await?;
        match deps.store.find_recipe(&recipe_id).await? {
            Some(recipe) => {
                debug!(recipe_id = %recipe_id, "Recipe cache hit");
                deps.store
                    .record_recipe_request_for_user(&recipe, search.as_ref(), &user)
                    .await?;
                recipe.instructions
            }
            None => {
                let info = deps.source.get_info_by_id(&recipe_id).await?;
                let steps = deps.source.get_steps_by_id(&recipe_id).await?;
                let text = format_instructions(&info, &steps);
                info!(recipe_id = %recipe_id, steps = steps.len(), "Fetched recipe from source");
                deps.store
                    .add_recipe(&recipe_id, &info.title, &text, search.as_ref(), &user)
                    .await?;
                text
            }
        }
    };

    session.clear();
    Ok(instructions)
}

/// 0-based index for a 1-based choice, if it names an offered candidate.
fn choice_index(selection: i64, offered: usize) -> Option<usize> {
    if !(1..=MAX_CHOICES as i64).contains(&selection) {
        return None;
    }
    let index = (selection - 1) as usize;
    (index < offered).then_some(index)
}
