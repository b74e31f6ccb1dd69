//! Configuration loading, merging, and run validation.
mod apply;
mod loader;
mod run;
pub mod types;


pub use apply::apply_config;
pub use loader::load_config;
pub use run::{RunConfig, build_run_config};
