//! Contracts for the external collaborators of the conversation core.
//!
//! The chat core only ever talks to these traits; concrete HTTP clients
//! live in `souschef-clients` and the SQLite store in `souschef-storage`.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    NluRequest, NluResponse, RecipeInfo, RecipeRecord, RecipeStep, RecipeSummary, SearchKind,
    SearchRecord, UserRecord,
};

/// Natural-language-understanding service.
#[async_trait]
pub trait NluGateway: Send + Sync {
    /// Send one turn of user text plus prior context, get back the new context,
    /// recognized entities, and generated output lines.
    async fn message(&self, request: NluRequest) -> Result<NluResponse>;
}

/// Remote recipe API.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn find_by_ingredients(&self, ingredients: &str) -> Result<Vec<RecipeSummary>>;

    async fn find_by_cuisine(&self, cuisine: &str) -> Result<Vec<RecipeSummary>>;

    async fn get_info_by_id(&self, recipe_id: &str) -> Result<RecipeInfo>;

    async fn get_steps_by_id(&self, recipe_id: &str) -> Result<Vec<RecipeStep>>;

    /// Dispatch to the search matching `kind`.
    async fn find(&self, kind: SearchKind, key: &str) -> Result<Vec<RecipeSummary>> {
        match kind {
            SearchKind::Ingredient => self.find_by_ingredients(key).await,
            SearchKind::Cuisine => self.find_by_cuisine(key).await,
        }
    }
}

/// Lookup-or-miss recipe cache with per-user usage counters.
///
/// Ingredient and cuisine searches share one set of operations keyed by
/// [`SearchKind`]; the named ingredient/cuisine methods are thin wrappers.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Verify the store is usable. Failure here is fatal at startup.
    async fn init(&self) -> Result<()>;

    /// Create the user, or return the existing record for `user_id`.
    async fn add_user(&self, user_id: &str) -> Result<UserRecord>;

    async fn find_search(&self, kind: SearchKind, key: &str) -> Result<Option<SearchRecord>>;

    /// Persist a new search with its candidates, counting one request for `user`.
    async fn add_search(
        &self,
        kind: SearchKind,
        key: &str,
        recipes: &[RecipeSummary],
        user: &UserRecord,
    ) -> Result<SearchRecord>;

    async fn record_search_request_for_user(
        &self,
        search: &SearchRecord,
        user: &UserRecord,
    ) -> Result<()>;

    async fn find_recipe(&self, recipe_id: &str) -> Result<Option<RecipeRecord>>;

    /// Persist a new recipe attributed to `search` (if any) and `user`.
    async fn add_recipe(
        &self,
        recipe_id: &str,
        title: &str,
        instructions: &str,
        search: Option<&SearchRecord>,
        user: &UserRecord,
    ) -> Result<RecipeRecord>;

    async fn record_recipe_request_for_user(
        &self,
        recipe: &RecipeRecord,
        search: Option<&SearchRecord>,
        user: &UserRecord,
    ) -> Result<()>;

    /// The user's most requested recipes, most popular first.
    async fn find_favorite_recipes_for_user(
        &self,
        user: &UserRecord,
        limit: usize,
    ) -> Result<Vec<RecipeSummary>>;

    async fn find_ingredient(&self, key: &str) -> Result<Option<SearchRecord>> {
        self.find_search(SearchKind::Ingredient, key).await
    }

    async fn add_ingredient(
        &self,
        key: &str,
        recipes: &[RecipeSummary],
        user: &UserRecord,
    ) -> Result<SearchRecord> {
        self.add_search(SearchKind::Ingredient, key, recipes, user).await
    }

    async fn record_ingredient_request_for_user(
        &self,
        ingredient: &SearchRecord,
        user: &UserRecord,
    ) -> Result<()> {
        self.record_search_request_for_user(ingredient, user).await
    }

    async fn find_cuisine(&self, key: &str) -> Result<Option<SearchRecord>> {
        self.find_search(SearchKind::Cuisine, key).await
    }

    async fn add_cuisine(
        &self,
        key: &str,
        recipes: &[RecipeSummary],
        user: &UserRecord,
    ) -> Result<SearchRecord> {
        self.add_search(SearchKind::Cuisine, key, recipes, user).await
    }

    async fn record_cuisine_request_for_user(
        &self,
        cuisine: &SearchRecord,
        user: &UserRecord,
    ) -> Result<()> {
        self.record_search_request_for_user(cuisine, user).await
    }
}
