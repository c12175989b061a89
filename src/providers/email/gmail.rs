//! Gmail API message store.
//!
//! This module provides a [`MessageStore`] implementation over the Gmail REST
//! API. Bearer tokens come from a [`TokenSource`]; obtaining, caching and
//! renewing them is the job of [`crate::auth`].
//!
//! # API Usage
//!
//! This store uses the Gmail API v1:
//! - `users.messages.list` for paging through message identifiers
//! - `users.messages.get` with `format=metadata` for header-only fetches

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;

use super::{MessagePage, MessageStore, PageCursor, Result, StoreError, TokenSource};
use crate::domain::{HeaderEntry, MessageId};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Response projection requested from `users.messages.get`.
const METADATA_FIELDS: &str = "id,payload/headers";

/// Gmail API message list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    messages: Option<Vec<GmailMessageRef>>,
    next_page_token: Option<String>,
    #[allow(dead_code)]
    result_size_estimate: Option<u32>,
}

/// Gmail API message reference inside a list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessageRef {
    id: String,
    #[allow(dead_code)]
    thread_id: Option<String>,
}

/// Gmail API message, restricted to the metadata fields we request.
#[derive(Debug, Deserialize)]
struct GmailMessage {
    #[allow(dead_code)]
    id: String,
    payload: Option<GmailMessagePayload>,
}

/// Gmail message payload (headers only).
#[derive(Debug, Deserialize)]
struct GmailMessagePayload {
    headers: Option<Vec<HeaderEntry>>,
}

/// Gmail REST message store.
///
/// Every request asks the [`TokenSource`] for the current access token. A
/// request rejected with 401 is retried once with a renewed token, so a
/// harvest outlives the hour an access token lasts.
///
/// # Example
///
/// ```ignore
/// use mailcrawl::providers::email::{GmailStore, MessageStore, PageCursor};
///
/// let store = GmailStore::new(authorizer);
/// let page = store.list_messages(&PageCursor::first(Some("in:sent"))).await?;
/// ```
pub struct GmailStore {
    /// HTTP client for API requests.
    client: reqwest::Client,
    /// Where bearer tokens come from.
    tokens: Arc<dyn TokenSource>,
    /// API root, overridable for tests against a local server.
    base_url: String,
}

impl GmailStore {
    /// Creates a store that authenticates with tokens from `tokens`.
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_base_url(tokens, GMAIL_API_BASE)
    }

    /// Creates a store against a custom API root.
    pub fn with_base_url(tokens: Arc<dyn TokenSource>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            base_url: base_url.into(),
        }
    }

    /// Builds authorization headers for API requests.
    fn auth_headers(access_token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", access_token))
                .map_err(|e| StoreError::Internal(format!("invalid header: {}", e)))?,
        );
        Ok(headers)
    }

    /// Query parameters for a `users.messages.list` call.
    fn list_params(cursor: &PageCursor) -> Vec<(&'static str, String)> {
        let mut params = vec![("maxResults", cursor.page_size.to_string())];
        if let Some(query) = &cursor.query {
            params.push(("q", query.clone()));
        }
        if let Some(token) = &cursor.page_token {
            params.push(("pageToken", token.clone()));
        }
        params
    }

    /// Query parameters for a header-only `users.messages.get` call.
    fn metadata_params() -> [(&'static str, &'static str); 2] {
        [("format", "metadata"), ("fields", METADATA_FIELDS)]
    }

    /// Makes an authenticated GET request to the Gmail API.
    async fn get<T, Q>(&self, endpoint: &str, query: &Q) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, endpoint);

        let token = self.tokens.current_token().await?;
        let mut response = self.send(&url, query, &token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!(endpoint, "Access token rejected, renewing");
            let token = self.tokens.renew_token().await?;
            response = self.send(&url, query, &token).await?;
        }

        self.handle_response(response).await
    }

    async fn send<Q>(&self, url: &str, query: &Q, access_token: &str) -> Result<reqwest::Response>
    where
        Q: serde::Serialize + ?Sized,
    {
        self.client
            .get(url)
            .headers(Self::auth_headers(access_token)?)
            .query(query)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    /// Handles API response, checking for errors.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Internal(format!("parse response: {}", e)))
    }

    /// Handles API error responses.
    async fn handle_error(&self, response: reqwest::Response) -> StoreError {
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await.unwrap_or_default();

        error_for_status(status.as_u16(), retry_after_secs, body)
    }
}

/// Maps a non-success HTTP status to a store error.
fn error_for_status(status: u16, retry_after_secs: Option<u64>, body: String) -> StoreError {
    match status {
        400 => StoreError::InvalidRequest(body),
        401 | 403 => StoreError::Authentication(format!("unauthorized ({}): {}", status, body)),
        404 => StoreError::NotFound(body),
        429 => StoreError::RateLimited { retry_after_secs },
        _ => StoreError::Internal(format!("API error ({}): {}", status, body)),
    }
}

#[async_trait]
impl MessageStore for GmailStore {
    async fn list_messages(&self, cursor: &PageCursor) -> Result<MessagePage> {
        let params = Self::list_params(cursor);
        let response: MessageListResponse = self.get("/messages", &params).await?;

        Ok(MessagePage {
            messages: response
                .messages
                .unwrap_or_default()
                .into_iter()
                .map(|m| MessageId::from(m.id))
                .collect(),
            next_page_token: response.next_page_token,
        })
    }

    async fn get_message_headers(&self, id: &MessageId) -> Result<Vec<HeaderEntry>> {
        let endpoint = format!("/messages/{}", id);
        let message: GmailMessage = self.get(&endpoint, &Self::metadata_params()).await?;

        Ok(message
            .payload
            .and_then(|p| p.headers)
            .unwrap_or_default())
    }
}
