//! OAuth client secret files as downloaded from the Google API console.

use std::path::Path;

use serde::Deserialize;

use super::{AuthError, Result};

/// Out-of-band redirect, no longer accepted by Google for new clients.
const OOB_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Redirect used when the secret file lists none we can use.
const LOCALHOST_REDIRECT: &str = "http://localhost";

/// Credentials of an "installed" (desktop) OAuth application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Authorization endpoint.
    pub auth_uri: String,
    /// Token endpoint.
    pub token_uri: String,
    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// On-disk wrapper: Google nests the fields under the application type.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Parses a client secret from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(json)
            .map_err(|e| AuthError::InvalidClientSecret(e.to_string()))?;

        file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidClientSecret("expected an \"installed\" or \"web\" entry".to_string())
        })
    }

    /// Reads and parses a client secret file.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AuthError::ClientSecretUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&json)
    }

    /// Picks the redirect URI used for the authorization request.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .iter()
            .map(String::as_str)
            .find(|uri| *uri != OOB_REDIRECT)
            .unwrap_or(LOCALHOST_REDIRECT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTALLED: &str = r#"{
        "installed": {
            "client_id": "123.apps.googleusercontent.com",
            "project_id": "crawler",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://accounts.google.com/o/oauth2/token",
            "client_secret": "shh",
            "redirect_uris": ["urn:ietf:wg:oauth:2.0:oob", "http://localhost"]
        }
    }"#;

    #[test]
    fn parses_installed_secret() {
        let secret = ClientSecret::from_json(INSTALLED).unwrap();
        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "shh");
        assert_eq!(secret.redirect_uris.len(), 2);
    }

    #[test]
    fn skips_out_of_band_redirect() {
        let secret = ClientSecret::from_json(INSTALLED).unwrap();
        assert_eq!(secret.redirect_uri(), "http://localhost");
    }

    #[test]
    fn falls_back_to_localhost_redirect() {
        let json = r#"{"web": {"client_id": "c", "client_secret": "s",
            "auth_uri": "https://a", "token_uri": "https://t"}}"#;
        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.redirect_uri(), LOCALHOST_REDIRECT);
    }

    #[test]
    fn rejects_unknown_shape() {
        let err = ClientSecret::from_json(r#"{"service_account": {}}"#).unwrap_err();
        assert!(matches!(err, AuthError::InvalidClientSecret(_)));
    }

    #[tokio::test]
    async fn missing_file_is_unreadable() {
        let err = ClientSecret::load(Path::new("/nonexistent/client_secret.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ClientSecretUnreadable { .. }));
    }
}
