//! Shared domain types for SousChef.
//!
//! These types flow between the NLU gateway, the recipe source, the recipe
//! store, and the conversation core. They carry no behavior beyond small
//! conversions and serde wiring.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Opaque conversation context owned by the NLU gateway.
///
/// The gateway sets mode flags in it (`is_favorites`, `is_ingredients`,
/// `is_selection`, `selection`); the conversation core adds a `recipes`
/// array of candidates.
pub type ConversationContext = Map<String, Value>;

// =============================================================================
// Users
// =============================================================================

/// A user known to the recipe store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Store-assigned row id.
    pub id: i64,
    /// Transport-level user identity.
    pub user_id: String,
}

// =============================================================================
// Ingredient / cuisine searches
// =============================================================================

/// The two kinds of recipe search a user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Ingredient,
    Cuisine,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Ingredient => "ingredient",
            SearchKind::Cuisine => "cuisine",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recipe candidate offered to the user: just enough to list and select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSummary {
    #[serde(deserialize_with = "deserialize_recipe_id")]
    pub id: String,
    pub title: String,
}

impl RecipeSummary {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A cached ingredient or cuisine search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Store-assigned row id.
    pub id: i64,
    pub kind: SearchKind,
    /// Normalized search key (ingredient text or cuisine name).
    pub key: String,
    /// Candidates returned by the recipe source when the key was first seen.
    pub recipes: Vec<RecipeSummary>,
}

/// A cached recipe with its rendered instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub id: String,
    pub title: String,
    pub instructions: String,
    /// The search that was active when the recipe was first selected.
    /// `None` when it was first selected from a favorites list.
    pub search_id: Option<i64>,
}

// =============================================================================
// Recipe source payloads
// =============================================================================

/// Recipe metadata used in the instructions intro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInfo {
    pub title: String,
    #[serde(default)]
    pub ready_in_minutes: u32,
    #[serde(default)]
    pub servings: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub name: String,
}

/// One step of a recipe's instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub step: String,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
}

// =============================================================================
// NLU gateway payloads
// =============================================================================

/// A request to the NLU gateway for one conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluRequest {
    pub text: String,
    /// Context returned by the previous turn; `None` on a first turn.
    pub context: Option<ConversationContext>,
    pub workspace_id: String,
}

/// An entity recognized by the NLU gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NluEntity {
    /// Entity category, e.g. `cuisine`.
    pub entity: String,
    pub value: String,
}

/// The gateway's answer for one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NluResponse {
    #[serde(default)]
    pub context: ConversationContext,
    #[serde(default)]
    pub entities: Vec<NluEntity>,
    /// Generated output text, one entry per line.
    #[serde(default)]
    pub output: Vec<String>,
}

/// Accept recipe ids as either JSON strings or JSON integers.
///
/// The recipe source reports numeric ids while candidates echoed back through
/// the conversation context may carry them as strings.
fn deserialize_recipe_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "recipe id must be a string or number, got {}",
            other
        ))),
    }
}
