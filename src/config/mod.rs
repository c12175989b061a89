//! Configuration and settings management.
//!
//! This module provides the command-line definition and the validated
//! settings a harvest run is driven by.

mod cli;
mod settings;

pub use cli::Cli;
pub use settings::{
    AuthSettings, ConfigError, HarvestSettings, Settings, DEFAULT_BLACKLIST,
    DEFAULT_CLIENT_SECRET, TOKEN_CACHE_FILE,
};
