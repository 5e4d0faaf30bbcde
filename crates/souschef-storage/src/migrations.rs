//! Database schema migrations.
//!
//! Version 1 creates the users, searches, recipes, and per-user request
//! counter tables.

use rusqlite::Connection;
use tracing::info;

use souschef_core::error::SousChefError;

/// Schema version this build expects.
pub const SCHEMA_VERSION: i64 = 1;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), SousChefError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| SousChefError::Storage(format!("Failed to create migrations table: {}", e)))?;

    if current_version(conn)? < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Highest applied migration version, 0 when none.
pub fn current_version(conn: &Connection) -> Result<i64, SousChefError> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| SousChefError::Storage(format!("Failed to query migration version: {}", e)))
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), SousChefError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL UNIQUE,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        -- Ingredient and cuisine searches share one table.
        CREATE TABLE IF NOT EXISTS searches (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            kind        TEXT NOT NULL CHECK (kind IN ('ingredient', 'cuisine')),
            key         TEXT NOT NULL,
            recipes     TEXT NOT NULL DEFAULT '[]',
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            UNIQUE (kind, key)
        );

        CREATE TABLE IF NOT EXISTS search_requests (
            search_id         INTEGER NOT NULL REFERENCES searches(id) ON DELETE CASCADE,
            user_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            count             INTEGER NOT NULL DEFAULT 0,
            last_requested_at INTEGER NOT NULL,
            PRIMARY KEY (search_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id           TEXT PRIMARY KEY NOT NULL,
            title        TEXT NOT NULL,
            instructions TEXT NOT NULL,
            search_id    INTEGER REFERENCES searches(id) ON DELETE SET NULL,
            created_at   INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE TABLE IF NOT EXISTS recipe_requests (
            recipe_id         TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            user_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            count             INTEGER NOT NULL DEFAULT 0,
            last_requested_at INTEGER NOT NULL,
            PRIMARY KEY (recipe_id, user_id)
        );

        -- How often a recipe was picked from a given search's candidates.
        CREATE TABLE IF NOT EXISTS recipe_sources (
            recipe_id   TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            search_id   INTEGER NOT NULL REFERENCES searches(id) ON DELETE CASCADE,
            count       INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (recipe_id, search_id)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_requests_user
            ON recipe_requests (user_id, count DESC, last_requested_at DESC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| SousChefError::Storage(format!("Failed to apply migration v1: {}", e)))
}
