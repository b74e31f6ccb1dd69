//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::PacerArgs;
pub use types::OutputFormat;

pub(crate) use defaults::{DEFAULT_CONFIG_FILES, DEFAULT_USER_AGENT};
