//! Reply text rendering.
//!
//! Pure functions of their input: the same candidates or recipe always
//! render to the same text.

use std::fmt::Write;

use souschef_core::types::{RecipeInfo, RecipeStep, RecipeSummary};

/// Sent when any part of a turn fails.
pub const FALLBACK_MESSAGE: &str = "Sorry, something went wrong! Say anything to me to start over...";

/// Sent for a selection outside the offered choices.
pub const INVALID_SELECTION_MESSAGE: &str =
    "Invalid selection! Say anything to see your choices again...";

/// Most candidates a user can choose between.
pub const MAX_CHOICES: usize = 5;

const LIST_HEADER: &str = "Lets see here...\nI've found these recipes: \n";
const LIST_FOOTER: &str = "\nPlease enter the corresponding number of your choice.";
const NO_INSTRUCTIONS: &str = "_No instructions available for this recipe._\n\n";
const START_OVER: &str = "*Say anything to me to start over...*";

/// Render a numbered candidate list, numbering from 1.
pub fn format_recipe_list(recipes: &[RecipeSummary]) -> String {
    let mut text = String::from(LIST_HEADER);
    for (i, recipe) in recipes.iter().enumerate() {
        let _ = writeln!(text, "{}.{}", i + 1, recipe.title);
    }
    text.push_str(LIST_FOOTER);
    text
}

/// Render recipe metadata and steps as instructions.
pub fn format_instructions(info: &RecipeInfo, steps: &[RecipeStep]) -> String {
    let mut text = format!(
        "Ok, it takes *{}* minutes to make *{}* servings of *{}*. Here are the steps:\n\n",
        info.ready_in_minutes, info.servings, info.title
    );

    if steps.is_empty() {
        text.push_str(NO_INSTRUCTIONS);
    } else {
        for (i, step) in steps.iter().enumerate() {
            let _ = write!(
                text,
                "*Step {}:*\n _Equipment:_ {}\n _Action:_ {}\n\n",
                i + 1,
                equipment_line(step),
                step.step
            );
        }
    }

    text.push_str(START_OVER);
    text
}

fn equipment_line(step: &RecipeStep) -> String {
    if step.equipment.is_empty() {
        return "None".to_string();
    }
    step.equipment
        .iter()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
