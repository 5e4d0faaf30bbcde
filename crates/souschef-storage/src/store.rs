//! SQLite implementation of the recipe store.
//!
//! Searches (ingredient or cuisine), recipes, and users are looked up by key;
//! every repeat use bumps a per-user counter with a single upsert statement.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use souschef_core::error::{Result, SousChefError};
use souschef_core::traits::RecipeStore;
use souschef_core::types::{RecipeRecord, RecipeSummary, SearchKind, SearchRecord, UserRecord};

use crate::db::Database;
use crate::migrations;

/// Recipe store backed by [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteRecipeStore {
    db: Arc<Database>,
}

impl SqliteRecipeStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Number of times `user` asked for `search`.
    pub fn search_request_count(&self, search_id: i64, user: &UserRecord) -> Result<i64> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COALESCE(
                    (SELECT count FROM search_requests WHERE search_id = ?1 AND user_id = ?2), 0)",
                rusqlite::params![search_id, user.id],
                |row| row.get(0),
            )
            .map_err(storage_err)
        })
    }

    /// Number of times `user` selected `recipe_id`.
    pub fn recipe_request_count(&self, recipe_id: &str, user: &UserRecord) -> Result<i64> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COALESCE(
                    (SELECT count FROM recipe_requests WHERE recipe_id = ?1 AND user_id = ?2), 0)",
                rusqlite::params![recipe_id, user.id],
                |row| row.get(0),
            )
            .map_err(storage_err)
        })
    }

    /// Number of times `recipe_id` was picked from `search_id`'s candidates.
    pub fn recipe_source_count(&self, recipe_id: &str, search_id: i64) -> Result<i64> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COALESCE(
                    (SELECT count FROM recipe_sources WHERE recipe_id = ?1 AND search_id = ?2), 0)",
                rusqlite::params![recipe_id, search_id],
                |row| row.get(0),
            )
            .map_err(storage_err)
        })
    }
}

#[async_trait]
impl RecipeStore for SqliteRecipeStore {
    async fn init(&self) -> Result<()> {
        let version = self.db.with_conn(migrations::current_version)?;
        if version < migrations::SCHEMA_VERSION {
            return Err(SousChefError::Storage(format!(
                "schema version {} is older than required {}",
                version,
                migrations::SCHEMA_VERSION
            )));
        }
        debug!(version, "Recipe store ready");
        Ok(())
    }

    async fn add_user(&self, user_id: &str) -> Result<UserRecord> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (user_id) VALUES (?1) ON CONFLICT(user_id) DO NOTHING",
                rusqlite::params![user_id],
            )
            .map_err(|e| SousChefError::Storage(format!("Failed to add user: {}", e)))?;

            let id: i64 = conn
                .query_row(
                    "SELECT id FROM users WHERE user_id = ?1",
                    rusqlite::params![user_id],
                    |row| row.get(0),
                )
                .map_err(storage_err)?;

            Ok(UserRecord {
                id,
                user_id: user_id.to_string(),
            })
        })
    }

    async fn find_search(&self, kind: SearchKind, key: &str) -> Result<Option<SearchRecord>> {
        self.db.with_conn(|conn| select_search(conn, kind, key))
    }

    async fn add_search(
        &self,
        kind: SearchKind,
        key: &str,
        recipes: &[RecipeSummary],
        user: &UserRecord,
    ) -> Result<SearchRecord> {
        let recipes_json = serde_json::to_string(recipes)?;
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;

            tx.execute(
                "INSERT INTO searches (kind, key, recipes) VALUES (?1, ?2, ?3)
                 ON CONFLICT(kind, key) DO NOTHING",
                rusqlite::params![kind.as_str(), key, recipes_json],
            )
            .map_err(|e| SousChefError::Storage(format!("Failed to add {}: {}", kind, e)))?;

            let search = select_search(&tx, kind, key)?.ok_or_else(|| {
                SousChefError::Storage(format!("{} '{}' vanished after insert", kind, key))
            })?;
            bump_search_request(&tx, search.id, user.id)?;

            tx.commit().map_err(storage_err)?;
            Ok(search)
        })
    }

    async fn record_search_request_for_user(
        &self,
        search: &SearchRecord,
        user: &UserRecord,
    ) -> Result<()> {
        self.db
            .with_conn(|conn| bump_search_request(conn, search.id, user.id))
    }

    async fn find_recipe(&self, recipe_id: &str) -> Result<Option<RecipeRecord>> {
        self.db.with_conn(|conn| select_recipe(conn, recipe_id))
    }

    async fn add_recipe(
        &self,
        recipe_id: &str,
        title: &str,
        instructions: &str,
        search: Option<&SearchRecord>,
        user: &UserRecord,
    ) -> Result<RecipeRecord> {
        let search_id = search.map(|s| s.id);
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;

            tx.execute(
                "INSERT INTO recipes (id, title, instructions, search_id) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO NOTHING",
                rusqlite::params![recipe_id, title, instructions, search_id],
            )
            .map_err(|e| SousChefError::Storage(format!("Failed to add recipe: {}", e)))?;

            let recipe = select_recipe(&tx, recipe_id)?.ok_or_else(|| {
                SousChefError::Storage(format!("recipe '{}' vanished after insert", recipe_id))
            })?;
            bump_recipe_request(&tx, recipe_id, search_id, user.id)?;

            tx.commit().map_err(storage_err)?;
            Ok(recipe)
        })
    }

    async fn record_recipe_request_for_user(
        &self,
        recipe: &RecipeRecord,
        search: Option<&SearchRecord>,
        user: &UserRecord,
    ) -> Result<()> {
        let search_id = search.map(|s| s.id);
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            bump_recipe_request(&tx, &recipe.id, search_id, user.id)?;
            tx.commit().map_err(storage_err)
        })
    }

    async fn find_favorite_recipes_for_user(
        &self,
        user: &UserRecord,
        limit: usize,
    ) -> Result<Vec<RecipeSummary>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT r.id, r.title
                     FROM recipe_requests q
                     JOIN recipes r ON r.id = q.recipe_id
                     WHERE q.user_id = ?1
                     ORDER BY q.count DESC, q.last_requested_at DESC, r.title ASC
                     LIMIT ?2",
                )
                .map_err(storage_err)?;

            let rows = stmt
                .query_map(rusqlite::params![user.id, limit as i64], |row| {
                    Ok(RecipeSummary {
                        id: row.get(0)?,
                        title: row.get(1)?,
                    })
                })
                .map_err(storage_err)?;

            let mut favorites = Vec::new();
            for row in rows {
                favorites.push(row.map_err(storage_err)?);
            }
            Ok(favorites)
        })
    }
}

// -- SQL helpers --

fn storage_err(e: rusqlite::Error) -> SousChefError {
    SousChefError::Storage(e.to_string())
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn select_search(conn: &Connection, kind: SearchKind, key: &str) -> Result<Option<SearchRecord>> {
    let row = conn
        .query_row(
            "SELECT id, recipes FROM searches WHERE kind = ?1 AND key = ?2",
            rusqlite::params![kind.as_str(), key],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()
        .map_err(storage_err)?;

    match row {
        Some((id, recipes_json)) => {
            let recipes: Vec<RecipeSummary> = serde_json::from_str(&recipes_json).map_err(|e| {
                SousChefError::Storage(format!("corrupt candidate list for {} '{}': {}", kind, key, e))
            })?;
            Ok(Some(SearchRecord {
                id,
                kind,
                key: key.to_string(),
                recipes,
            }))
        }
        None => Ok(None),
    }
}

fn select_recipe(conn: &Connection, recipe_id: &str) -> Result<Option<RecipeRecord>> {
    conn.query_row(
        "SELECT id, title, instructions, search_id FROM recipes WHERE id = ?1",
        rusqlite::params![recipe_id],
        |row| {
            Ok(RecipeRecord {
                id: row.get(0)?,
                title: row.get(1)?,
                instructions: row.get(2)?,
                search_id: row.get(3)?,
            })
        },
    )
    .optional()
    .map_err(storage_err)
}

fn bump_search_request(conn: &Connection, search_id: i64, user_id: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO search_requests (search_id, user_id, count, last_requested_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT(search_id, user_id)
         DO UPDATE SET count = count + 1, last_requested_at = excluded.last_requested_at",
        rusqlite::params![search_id, user_id, now()],
    )
    .map_err(|e| SousChefError::Storage(format!("Failed to record search request: {}", e)))?;
    Ok(())
}

fn bump_recipe_request(
    conn: &Connection,
    recipe_id: &str,
    search_id: Option<i64>,
    user_id: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO recipe_requests (recipe_id, user_id, count, last_requested_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT(recipe_id, user_id)
         DO UPDATE SET count = count + 1, last_requested_at = excluded.last_requested_at",
        rusqlite::params![recipe_id, user_id, now()],
    )
    .map_err(|e| SousChefError::Storage(format!("Failed to record recipe request: {}", e)))?;

    if let Some(search_id) = search_id {
        conn.execute(
            "INSERT INTO recipe_sources (recipe_id, search_id, count) VALUES (?1, ?2, 1)
             ON CONFLICT(recipe_id, search_id) DO UPDATE SET count = count + 1",
            rusqlite::params![recipe_id, search_id],
        )
        .map_err(|e| SousChefError::Storage(format!("Failed to record recipe source: {}", e)))?;
    }
    Ok(())
}
