//! On-disk cache of OAuth tokens.
//!
//! The cache is a small JSON file readable only by its owner. Anything wrong
//! with it (missing, unreadable, corrupt) just means the user has to
//! authorize again.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthError, Result};

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An access token together with what is needed to renew it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Long-lived token used to obtain new access tokens.
    pub refresh_token: Option<String>,
    /// When the access token stops being valid, if known.
    #[serde(alias = "expiry")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Returns whether the access token should be renewed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| now + Duration::seconds(EXPIRY_MARGIN_SECS) >= at)
    }

    /// Returns whether the access token should be renewed now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// JSON file holding a [`CachedToken`].
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    /// Creates a cache backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached token.
    pub async fn load(&self) -> Result<CachedToken> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| AuthError::TokenCache {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_str(&json).map_err(|e| AuthError::CorruptTokenCache(e.to_string()))
    }

    /// Writes the token, creating the parent directory if needed.
    pub async fn save(&self, token: &CachedToken) -> Result<()> {
        let json = serde_json::to_string_pretty(token)
            .map_err(|e| AuthError::CorruptTokenCache(e.to_string()))?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_private(&path, json.as_bytes()))
            .await
            .map_err(|e| AuthError::TaskFailed(e.to_string()))?
            .map_err(|source| AuthError::TokenCache {
                path: self.path.clone(),
                source,
            })?;

        tracing::info!(path = %self.path.display(), "Saved credential file");
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}
