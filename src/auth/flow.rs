//! Installed-application OAuth flow.
//!
//! The [`Authorizer`] hands out an access token for the Gmail API, reusing
//! the cached one while it is valid, refreshing it when it has expired, and
//! falling back to asking the user to authorize in a browser. During the
//! harvest it keeps refreshing the token as a [`TokenSource`].

use async_trait::async_trait;
use chrono::Utc;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret as OAuthClientSecret, CsrfToken,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::client_secret::ClientSecret;
use super::token_cache::{CachedToken, TokenCache};
use super::{AuthError, Result};
use crate::providers::email::{Result as StoreResult, StoreError, TokenSource};

/// Read-only access to the mailbox is all the harvester needs.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Obtains access tokens, caching them on disk between runs.
///
/// After [`Authorizer::authorize`] succeeds, the authorizer is the
/// [`TokenSource`] of the store and keeps the token fresh for the rest of
/// the run.
pub struct Authorizer {
    client: BasicClient,
    cache: TokenCache,
    current: Mutex<Option<CachedToken>>,
}

impl Authorizer {
    /// Creates an authorizer for the given OAuth application.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidClientSecret`] if an endpoint or redirect
    /// URI in the secret is not a valid URL.
    pub fn new(secret: &ClientSecret, cache: TokenCache) -> Result<Self> {
        let invalid = |e: url::ParseError| AuthError::InvalidClientSecret(e.to_string());

        let client = BasicClient::new(
            ClientId::new(secret.client_id.clone()),
            Some(OAuthClientSecret::new(secret.client_secret.clone())),
            AuthUrl::new(secret.auth_uri.clone()).map_err(invalid)?,
            Some(TokenUrl::new(secret.token_uri.clone()).map_err(invalid)?),
        )
        .set_redirect_uri(RedirectUrl::new(secret.redirect_uri().to_string()).map_err(invalid)?);

        Ok(Self {
            client,
            cache,
            current: Mutex::new(None),
        })
    }

    /// URL the user must visit to grant access, with the state it carries.
    pub fn authorize_url(&self) -> (url::Url, CsrfToken) {
        self.client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(GMAIL_READONLY_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .url()
    }

    /// Obtains a valid access token, prompting on the terminal if needed.
    pub async fn authorize(&self) -> Result<String> {
        let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stderr = tokio::io::stderr();
        self.authorize_with(&mut stdin, &mut stderr).await
    }

    /// Obtains a valid access token, reading an authorization code from
    /// `input` and writing instructions to `prompt` if needed.
    pub async fn authorize_with<R, W>(&self, input: &mut R, prompt: &mut W) -> Result<String>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let token = match self.reuse_cached().await {
            Some(token) => token,
            None => self.authorize_interactive(input, prompt).await?,
        };

        let access_token = token.access_token.clone();
        *self.current.lock().await = Some(token);
        Ok(access_token)
    }

    /// Returns the cached token, refreshed if it has expired.
    async fn reuse_cached(&self) -> Option<CachedToken> {
        let token = match self.cache.load().await {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "No usable cached token");
                return None;
            }
        };
        if !token.is_expired() {
            return Some(token);
        }

        let refresh = token.refresh_token.as_deref()?;
        match self.refresh(refresh).await {
            Ok(fresh) => Some(fresh),
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, authorizing again");
                None
            }
        }
    }

    /// Exchanges a refresh token for a new access token and caches it.
    async fn refresh(&self, refresh_token: &str) -> Result<CachedToken> {
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let token = cached_from_response(&response, Some(refresh_token));
        self.cache.save(&token).await?;
        tracing::info!("Refreshed access token");
        Ok(token)
    }

    /// Refreshes the held token in place.
    async fn renew_held(&self, current: &mut Option<CachedToken>) -> StoreResult<String> {
        let refresh = current
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or_else(|| {
                StoreError::Authentication("access token expired and cannot be refreshed".to_string())
            })?;

        let fresh = self
            .refresh(&refresh)
            .await
            .map_err(|e| StoreError::Authentication(e.to_string()))?;
        let access_token = fresh.access_token.clone();
        *current = Some(fresh);
        Ok(access_token)
    }

    /// Asks the user to authorize in a browser and paste back the code.
    async fn authorize_interactive<R, W>(&self, input: &mut R, prompt: &mut W) -> Result<CachedToken>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (url, state) = self.authorize_url();
        let message = format!(
            "Go to the following link in your browser then type the authorization code \
             (or paste the URL you were redirected to):\n{}\n",
            url
        );
        prompt.write_all(message.as_bytes()).await?;
        prompt.flush().await?;

        let mut line = String::new();
        input.read_line(&mut line).await?;
        let code = extract_code(&line, state.secret())?;

        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let token = cached_from_response(&response, None);
        self.cache.save(&token).await?;
        Ok(token)
    }
}

#[async_trait]
impl TokenSource for Authorizer {
    async fn current_token(&self) -> StoreResult<String> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.access_token.clone());
        }
        if current.is_none() {
            return Err(StoreError::Authentication("not authorized".to_string()));
        }
        self.renew_held(&mut current).await
    }

    async fn renew_token(&self) -> StoreResult<String> {
        let mut current = self.current.lock().await;
        self.renew_held(&mut current).await
    }
}

/// Pulls the authorization code out of what the user typed.
///
/// Accepts either the bare code or the full redirect URL carrying it. A
/// pasted URL must carry the `state` the authorization URL was issued with.
pub fn extract_code(input: &str, expected_state: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuthError::MissingCode);
    }

    let url = match url::Url::parse(input) {
        Ok(url) => url,
        Err(_) => return Ok(input.to_string()),
    };
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if param("state").as_deref() != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }
    param("code")
        .filter(|code| !code.is_empty())
        .ok_or(AuthError::MissingCode)
}

/// Builds a cache entry from a token endpoint response.
///
/// Refresh responses usually omit the refresh token; the previous one is
/// kept in that case.
fn cached_from_response(response: &BasicTokenResponse, previous_refresh: Option<&str>) -> CachedToken {
    CachedToken {
        access_token: response.access_token().secret().clone(),
        refresh_token: response
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| previous_refresh.map(str::to_owned)),
        expires_at: response
            .expires_in()
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .map(|d| Utc::now() + d),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::test_support::serve;

    const FRESH_TOKEN: &str =
        r#"{"access_token":"fresh","token_type":"Bearer","expires_in":3600}"#;

    fn secret() -> ClientSecret {
        secret_with_token_uri("https://oauth2.googleapis.com/token")
    }

    fn secret_with_token_uri(token_uri: &str) -> ClientSecret {
        ClientSecret {
            client_id: "client-1".to_string(),
            client_secret: "shh".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_uri: token_uri.to_string(),
            redirect_uris: vec!["http://localhost".to_string()],
        }
    }

    fn token(access: &str, refresh: Option<&str>, expires_in: Duration) -> CachedToken {
        CachedToken {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_owned),
            expires_at: Some(Utc::now() + expires_in),
        }
    }

    #[test]
    fn extract_bare_code() {
        assert_eq!(extract_code("  4/0Abc-123\n", "xyz").unwrap(), "4/0Abc-123");
    }

    #[test]
    fn extract_code_from_redirect_url() {
        let url = "http://localhost/?state=xyz&code=4/0Abc&scope=gmail.readonly";
        assert_eq!(extract_code(url, "xyz").unwrap(), "4/0Abc");
    }

    #[test]
    fn redirect_url_with_foreign_state_is_rejected() {
        let forged = "http://localhost/?state=other&code=4/0Abc";
        assert!(matches!(
            extract_code(forged, "xyz"),
            Err(AuthError::StateMismatch)
        ));

        let stateless = "http://localhost/?code=4/0Abc";
        assert!(matches!(
            extract_code(stateless, "xyz"),
            Err(AuthError::StateMismatch)
        ));
    }

    #[test]
    fn extract_code_rejects_empty_input() {
        assert!(matches!(extract_code("\n", "xyz"), Err(AuthError::MissingCode)));
        assert!(matches!(
            extract_code("http://localhost/?state=xyz&error=access_denied", "xyz"),
            Err(AuthError::MissingCode)
        ));
    }

    #[test]
    fn authorize_url_requests_offline_readonly_access() {
        let dir = tempfile::tempdir().unwrap();
        let authorizer =
            Authorizer::new(&secret(), TokenCache::new(dir.path().join("t.json"))).unwrap();

        let (url, state) = authorizer.authorize_url();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("scope".to_string(), GMAIL_READONLY_SCOPE.to_string())));
        assert!(pairs.contains(&("access_type".to_string(), "offline".to_string())));
        assert!(pairs.contains(&("client_id".to_string(), "client-1".to_string())));
        assert!(pairs.contains(&("redirect_uri".to_string(), "http://localhost".to_string())));
        assert!(pairs.contains(&("state".to_string(), state.secret().clone())));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let mut bad = secret();
        bad.token_uri = "not a url".to_string();
        let result = Authorizer::new(&bad, TokenCache::new("unused.json"));
        assert!(matches!(result, Err(AuthError::InvalidClientSecret(_))));
    }

    #[tokio::test]
    async fn valid_cached_token_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("t.json"));
        cache
            .save(&token("cached", None, Duration::hours(1)))
            .await
            .unwrap();

        let authorizer = Authorizer::new(&secret(), cache).unwrap();
        let mut input: &[u8] = b"";
        let mut prompt = Vec::new();
        let access = authorizer
            .authorize_with(&mut input, &mut prompt)
            .await
            .unwrap();

        assert_eq!(access, "cached");
        assert!(prompt.is_empty());
        assert_eq!(authorizer.current_token().await.unwrap(), "cached");
    }

    #[tokio::test]
    async fn missing_code_fails_interactive_flow() {
        let dir = tempfile::tempdir().unwrap();
        let authorizer =
            Authorizer::new(&secret(), TokenCache::new(dir.path().join("t.json"))).unwrap();

        let mut input: &[u8] = b"\n";
        let mut prompt = Vec::new();
        let result = authorizer.authorize_with(&mut input, &mut prompt).await;

        assert!(matches!(result, Err(AuthError::MissingCode)));
        let shown = String::from_utf8(prompt).unwrap();
        assert!(shown.contains("accounts.google.com"));
    }

    #[tokio::test]
    async fn expired_cached_token_is_refreshed_at_startup() {
        let (base, log) = serve(|_| (200, FRESH_TOKEN.to_string())).await;
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("t.json"));
        cache
            .save(&token("old", Some("1//r"), -Duration::hours(1)))
            .await
            .unwrap();

        let authorizer =
            Authorizer::new(&secret_with_token_uri(&format!("{}/token", base)), cache.clone())
                .unwrap();
        let mut input: &[u8] = b"";
        let mut prompt = Vec::new();
        let access = authorizer
            .authorize_with(&mut input, &mut prompt)
            .await
            .unwrap();

        assert_eq!(access, "fresh");
        assert!(log.lock().unwrap()[0].body.contains("grant_type=refresh_token"));
        let saved = cache.load().await.unwrap();
        assert_eq!(saved.access_token, "fresh");
        assert_eq!(saved.refresh_token.as_deref(), Some("1//r"));
    }

    #[tokio::test]
    async fn token_expiring_during_run_is_renewed_before_use() {
        let (base, log) = serve(|_| (200, FRESH_TOKEN.to_string())).await;
        let dir = tempfile::tempdir().unwrap();
        let authorizer = Authorizer::new(
            &secret_with_token_uri(&format!("{}/token", base)),
            TokenCache::new(dir.path().join("t.json")),
        )
        .unwrap();
        *authorizer.current.lock().await = Some(token("old", Some("1//r"), Duration::seconds(10)));

        assert_eq!(authorizer.current_token().await.unwrap(), "fresh");
        assert_eq!(log.lock().unwrap().len(), 1);

        // The renewed token is held, not refreshed again.
        assert_eq!(authorizer.current_token().await.unwrap(), "fresh");
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn renewal_without_refresh_token_fails() {
        let dir = tempfile::tempdir().unwrap();
        let authorizer =
            Authorizer::new(&secret(), TokenCache::new(dir.path().join("t.json"))).unwrap();
        *authorizer.current.lock().await = Some(token("old", None, Duration::hours(1)));

        assert!(matches!(
            authorizer.renew_token().await,
            Err(StoreError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn token_source_requires_authorization_first() {
        let authorizer = Authorizer::new(&secret(), TokenCache::new("unused.json")).unwrap();
        assert!(matches!(
            authorizer.current_token().await,
            Err(StoreError::Authentication(_))
        ));
    }
}
