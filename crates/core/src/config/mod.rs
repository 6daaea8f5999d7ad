//! Application configuration.
//!
//! Loaded from a TOML file with `CLIPFETCH_`-prefixed environment variable
//! overrides. Every field has a default, so an empty file is a valid config.

mod loader;
mod types;

pub use loader::{load_config, load_config_from_str};
pub use types::{Config, ConfigError};
