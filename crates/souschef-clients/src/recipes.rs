//! Recipe API client.
//!
//! Searches by ingredients or cuisine and fetches recipe metadata and
//! analyzed step-by-step instructions.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use souschef_core::config::RecipeApiConfig;
use souschef_core::error::{Result, SousChefError};
use souschef_core::traits::RecipeSource;
use souschef_core::types::{RecipeInfo, RecipeStep, RecipeSummary};

#[derive(Deserialize)]
struct ComplexSearchResponse {
    #[serde(default)]
    results: Vec<RecipeSummary>,
}

#[derive(Deserialize)]
struct InstructionBlock {
    #[serde(default)]
    steps: Vec<RecipeStep>,
}

/// Recipe source backed by a Spoonacular-compatible REST API.
pub struct SpoonacularRecipeSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_results: usize,
}

impl SpoonacularRecipeSource {
    pub fn new(config: &RecipeApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                SousChefError::Config(format!("Failed to build recipe API client: {}", e))
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SousChefError::RecipeSource(format!("GET {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SousChefError::RecipeSource(format!(
                "GET {} returned {}: {}",
                path, status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SousChefError::RecipeSource(format!("invalid {} response: {}", path, e)))
    }
}

#[async_trait]
impl RecipeSource for SpoonacularRecipeSource {
    async fn find_by_ingredients(&self, ingredients: &str) -> Result<Vec<RecipeSummary>> {
        let recipes: Vec<RecipeSummary> = self
            .get_json(
                "recipes/findByIngredients",
                &[
                    ("ingredients", ingredients.to_string()),
                    ("number", self.max_results.to_string()),
                ],
            )
            .await?;
        debug!(ingredients, found = recipes.len(), "Searched recipes by ingredients");
        Ok(recipes)
    }

    async fn find_by_cuisine(&self, cuisine: &str) -> Result<Vec<RecipeSummary>> {
        let response: ComplexSearchResponse = self
            .get_json(
                "recipes/complexSearch",
                &[
                    ("cuisine", cuisine.to_string()),
                    ("number", self.max_results.to_string()),
                ],
            )
            .await?;
        debug!(cuisine, found = response.results.len(), "Searched recipes by cuisine");
        Ok(response.results)
    }

    async fn get_info_by_id(&self, recipe_id: &str) -> Result<RecipeInfo> {
        self.get_json(&format!("recipes/{}/information", recipe_id), &[])
            .await
    }

    async fn get_steps_by_id(&self, recipe_id: &str) -> Result<Vec<RecipeStep>> {
        let blocks: Vec<InstructionBlock> = self
            .get_json(&format!("recipes/{}/analyzedInstructions", recipe_id), &[])
            .await?;
        Ok(blocks.into_iter().next().map(|b| b.steps).unwrap_or_default())
    }
}
