//! Conversation core for SousChef.
//!
//! Routes each chat turn through the NLU gateway, classifies the result into
//! a [`TurnMode`], and runs the matching handler against the recipe store and
//! recipe source. Sessions are kept per user and turns for one user never
//! overlap.

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod keylock;
pub mod mode;
pub mod queue;
pub mod response;
pub mod session;
pub mod transport;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::ChatError;
pub use keylock::KeyLocks;
pub use mode::TurnMode;
pub use queue::TurnQueue;
pub use response::{format_instructions, format_recipe_list, FALLBACK_MESSAGE, INVALID_SELECTION_MESSAGE};
pub use session::{Session, SessionManager};
pub use transport::{ChatTransport, IncomingMessage};
