//! SousChef storage crate - SQLite-backed recipe cache.
//!
//! Provides a WAL-mode SQLite database with migrations and the
//! `RecipeStore` implementation used by the conversation core.

pub mod db;
pub mod migrations;
pub mod store;

pub use db::Database;
pub use store::SqliteRecipeStore;
