pub mod config;
pub mod error;

// Recipe records and the text processing around them
pub mod recipe;

// Embedding and the persisted vector index
pub mod index;

// Candidate scoring and the query facade
pub mod assistant;
pub mod selector;

// Accounts
pub mod db;

// HTTP API
pub mod api;

// Command line
pub mod cli;

// Re-exports
pub use assistant::KitchenAssistant;
pub use config::Settings;
pub use error::{Error, Result};
pub use selector::{Answer, SelectionResult};
