pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::SousChefConfig;
pub use error::{Result, SousChefError};
pub use traits::{NluGateway, RecipeSource, RecipeStore};
pub use types::*;
