//! Harvest settings and configuration types.
//!
//! Settings are built from the command line (see [`super::Cli`]) and
//! validated before any network activity takes place.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::{AddressFilter, OutputFormat};

/// Addresses not worth collecting: bounces, daemons and no-reply senders.
pub const DEFAULT_BLACKLIST: &str = r"(mailer-daemon|password|\+bnc[A-Z0-9]*|bounce|bounce-.*|no-reply.*|do-not-reply.*|noreply.*|bounces?\+.*|prvs=.*=)@|notify@twitter.com|@((docs|.*\.bounces)\.google\.com|bounce.twitter.com)";

/// Default location of the OAuth client secret downloaded from Google.
pub const DEFAULT_CLIENT_SECRET: &str = "client_secret.json";

/// Token cache file name inside `~/.credentials`.
pub const TOKEN_CACHE_FILE: &str = "gmailcrawl.json";

/// Errors in user-supplied configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A blacklist or whitelist pattern failed to compile.
    #[error("could not compile {which} into a valid regular expression: {source}")]
    InvalidPattern {
        /// Which pattern was malformed.
        which: &'static str,
        /// Underlying compile error.
        source: regex::Error,
    },

    /// No home directory to place the token cache in.
    #[error("unable to determine home directory for the token cache")]
    NoHomeDirectory,
}

/// Top-level settings for a harvest run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// What to harvest.
    pub harvest: HarvestSettings,
    /// Where credentials live.
    pub auth: AuthSettings,
    /// How to print results.
    pub output: OutputFormat,
}

/// Selection and filtering of harvested messages and addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestSettings {
    /// Gmail search query selecting the messages; empty selects all.
    pub query: String,
    /// Maximum number of messages to process; 0 is unlimited.
    pub limit: u64,
    /// Addresses matching this pattern are dropped; empty disables.
    pub blacklist: String,
    /// Only addresses matching this pattern are kept; empty disables.
    pub whitelist: String,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: 0,
            blacklist: DEFAULT_BLACKLIST.to_string(),
            whitelist: String::new(),
        }
    }
}

/// Credential file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// OAuth client secret JSON ("installed" application).
    pub client_secret_path: PathBuf,
    /// Token cache override; `~/.credentials/gmailcrawl.json` when unset.
    pub token_cache_path: Option<PathBuf>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            client_secret_path: PathBuf::from(DEFAULT_CLIENT_SECRET),
            token_cache_path: None,
        }
    }
}

impl Settings {
    /// Compiles the address filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] if a pattern is malformed.
    pub fn filter(&self) -> Result<AddressFilter, ConfigError> {
        AddressFilter::new(
            Some(self.harvest.blacklist.as_str()),
            Some(self.harvest.whitelist.as_str()),
        )
    }

    /// The search query, if one was given.
    pub fn query(&self) -> Option<&str> {
        Some(self.harvest.query.as_str()).filter(|q| !q.is_empty())
    }

    /// The message limit, if one was given.
    pub fn limit(&self) -> Option<u64> {
        Some(self.harvest.limit).filter(|&l| l > 0)
    }

    /// Resolves the token cache location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDirectory`] when no override is set and
    /// the home directory cannot be determined.
    pub fn token_cache_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.auth.token_cache_path {
            return Ok(path.clone());
        }
        let dirs = directories::BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(dirs.home_dir().join(".credentials").join(TOKEN_CACHE_FILE))
    }
}
