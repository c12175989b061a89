//! OAuth 2.0 authorization for the Gmail API.
//!
//! This module turns a client secret file into an access token:
//!
//! - [`ClientSecret`] - the OAuth application credentials
//! - [`TokenCache`] - tokens persisted between runs
//! - [`Authorizer`] - cached, refreshed, or interactively obtained tokens,
//!   kept fresh during the harvest

mod client_secret;
mod flow;
mod token_cache;

use std::path::PathBuf;

use thiserror::Error;

pub use client_secret::ClientSecret;
pub use flow::{extract_code, Authorizer, GMAIL_READONLY_SCOPE};
pub use token_cache::{CachedToken, TokenCache};

/// Errors that can occur while obtaining an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The client secret file could not be read.
    #[error("unable to read client secret file {}: {source}", path.display())]
    ClientSecretUnreadable {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The client secret file is not a usable OAuth application.
    #[error("invalid client secret: {0}")]
    InvalidClientSecret(String),

    /// The token cache could not be read or written.
    #[error("token cache {}: {source}", path.display())]
    TokenCache {
        /// Path of the cache file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The token cache holds something that is not a token.
    #[error("corrupt token cache: {0}")]
    CorruptTokenCache(String),

    /// The user did not supply an authorization code.
    #[error("no authorization code entered")]
    MissingCode,

    /// A pasted redirect URL was not issued for this authorization request.
    #[error("redirect URL does not match the authorization request")]
    StateMismatch,

    /// The token endpoint rejected the exchange.
    #[error("unable to retrieve token: {0}")]
    Exchange(String),

    /// Terminal I/O failed during the interactive flow.
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking task could not be joined.
    #[error("failed to spawn blocking task: {0}")]
    TaskFailed(String),
}

/// Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthError>;
