use thiserror::Error;

/// Top-level error type for SousChef.
///
/// Collaborators (store, NLU gateway, recipe source, transports) all report
/// failures through this type so that the turn dispatcher can classify them
/// with a single `match`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SousChefError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("NLU gateway error: {0}")]
    Gateway(String),

    #[error("Recipe source error: {0}")]
    RecipeSource(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SousChefError {
    fn from(err: toml::de::Error) -> Self {
        SousChefError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SousChefError {
    fn from(err: toml::ser::Error) -> Self {
        SousChefError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SousChefError {
    fn from(err: serde_json::Error) -> Self {
        SousChefError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for SousChef operations.
pub type Result<T> = std::result::Result<T, SousChefError>;
