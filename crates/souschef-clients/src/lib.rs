//! HTTP clients for the remote collaborators of SousChef.
//!
//! - [`WatsonNluGateway`]: conversation service that interprets each turn.
//! - [`SpoonacularRecipeSource`]: recipe search and instructions API.

pub mod nlu;
pub mod recipes;

pub use nlu::WatsonNluGateway;
pub use recipes::SpoonacularRecipeSource;
