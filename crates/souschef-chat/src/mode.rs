//! Turn classification.
//!
//! Turns the NLU gateway's answer into one [`TurnMode`] using a fixed
//! precedence: favorites, ingredients, cuisine entity, selection, start.

use serde_json::Value;

use souschef_core::types::{ConversationContext, NluResponse};

pub const FAVORITES_FLAG: &str = "is_favorites";
pub const INGREDIENTS_FLAG: &str = "is_ingredients";
pub const SELECTION_FLAG: &str = "is_selection";
pub const SELECTION_FIELD: &str = "selection";
pub const CUISINE_ENTITY: &str = "cuisine";

/// Sentinel selection for a missing or unparsable number.
pub const NO_SELECTION: i64 = -1;

/// Which handler a turn is routed to, with that handler's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnMode {
    Favorites,
    /// Raw user text used as the ingredient query.
    Ingredients(String),
    /// Value of the first recognized cuisine entity.
    Cuisine(String),
    /// 1-based choice from the candidate list, or [`NO_SELECTION`].
    Selection(i64),
    Start,
}

impl TurnMode {
    /// Classify a gateway response. `input` is the user's raw text for this turn.
    pub fn classify(response: &NluResponse, input: &str) -> Self {
        let ctx = &response.context;
        if flag(ctx, FAVORITES_FLAG) {
            return TurnMode::Favorites;
        }
        if flag(ctx, INGREDIENTS_FLAG) {
            return TurnMode::Ingredients(input.to_string());
        }
        if let Some(entity) = response.entities.first() {
            if entity.entity == CUISINE_ENTITY {
                return TurnMode::Cuisine(entity.value.clone());
            }
        }
        if flag(ctx, SELECTION_FLAG) {
            return TurnMode::Selection(parse_selection(ctx.get(SELECTION_FIELD)));
        }
        TurnMode::Start
    }

    pub fn name(&self) -> &'static str {
        match self {
            TurnMode::Favorites => "favorites",
            TurnMode::Ingredients(_) => "ingredients",
            TurnMode::Cuisine(_) => "cuisine",
            TurnMode::Selection(_) => "selection",
            TurnMode::Start => "start",
        }
    }
}

fn flag(ctx: &ConversationContext, name: &str) -> bool {
    matches!(ctx.get(name), Some(Value::Bool(true)))
}

fn parse_selection(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(NO_SELECTION),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(NO_SELECTION),
        _ => NO_SELECTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use souschef_core::types::NluEntity;

    fn response(context: Value, entities: Vec<(&str, &str)>) -> NluResponse {
        NluResponse {
            context: serde_json::from_value(context).unwrap(),
            entities: entities
                .into_iter()
                .map(|(e, v)| NluEntity {
                    entity: e.to_string(),
                    value: v.to_string(),
                })
                .collect(),
            output: vec![],
        }
    }

    #[test]
    fn test_empty_response_is_start() {
        assert_eq!(TurnMode::classify(&NluResponse::default(), "hi"), TurnMode::Start);
    }

    #[test]
    fn test_favorites_wins_over_everything() {
        let r = response(
            json!({"is_favorites": true, "is_ingredients": true, "is_selection": true}),
            vec![("cuisine", "thai")],
        );
        assert_eq!(TurnMode::classify(&r, "x"), TurnMode::Favorites);
    }

    #[test]
    fn test_ingredients_uses_raw_text() {
        let r = response(json!({"is_ingredients": true}), vec![("cuisine", "thai")]);
        assert_eq!(
            TurnMode::classify(&r, "chicken, garlic"),
            TurnMode::Ingredients("chicken, garlic".to_string())
        );
    }

    #[test]
    fn test_cuisine_entity_before_selection() {
        let r = response(
            json!({"is_selection": true, "selection": "2"}),
            vec![("cuisine", "thai")],
        );
        assert_eq!(TurnMode::classify(&r, "thai"), TurnMode::Cuisine("thai".to_string()));
    }

    #[test]
    fn test_only_first_entity_counts() {
        let r = response(json!({}), vec![("ingredient", "rice"), ("cuisine", "thai")]);
        assert_eq!(TurnMode::classify(&r, "rice"), TurnMode::Start);
    }

    #[test]
    fn test_selection_parses_string_and_number() {
        let r = response(json!({"is_selection": true, "selection": "3"}), vec![]);
        assert_eq!(TurnMode::classify(&r, "3"), TurnMode::Selection(3));
        let r = response(json!({"is_selection": true, "selection": 4}), vec![]);
        assert_eq!(TurnMode::classify(&r, "4"), TurnMode::Selection(4));
    }

    #[test]
    fn test_selection_sentinel_when_missing_or_bad() {
        let r = response(json!({"is_selection": true}), vec![]);
        assert_eq!(TurnMode::classify(&r, ""), TurnMode::Selection(NO_SELECTION));
        let r = response(json!({"is_selection": true, "selection": "three"}), vec![]);
        assert_eq!(TurnMode::classify(&r, ""), TurnMode::Selection(NO_SELECTION));
        let r = response(json!({"is_selection": true, "selection": 2.5}), vec![]);
        assert_eq!(TurnMode::classify(&r, ""), TurnMode::Selection(NO_SELECTION));
    }

    #[test]
    fn test_false_or_non_bool_flags_ignored() {
        let r = response(json!({"is_favorites": false, "is_ingredients": "true"}), vec![]);
        assert_eq!(TurnMode::classify(&r, "x"), TurnMode::Start);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(TurnMode::Favorites.name(), "favorites");
        assert_eq!(TurnMode::Selection(1).name(), "selection");
        assert_eq!(TurnMode::Cuisine("x".into()).name(), "cuisine");
    }
}
