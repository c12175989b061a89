//! Message store trait definition.
//!
//! This module defines the [`MessageStore`] trait which abstracts over the
//! remote mailbox the harvester reads from. The harvester only ever lists
//! message identifiers page by page and fetches header metadata for each one,
//! so that is all a store has to provide.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{HeaderEntry, MessageId};

/// Result type alias for message store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Page size requested from the backend: as many as it allows per call.
pub const UNBOUNDED_PAGE_SIZE: u32 = 10_000_000;

/// Errors that can occur during message store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Authentication failed or credentials expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Position in the store's paginated message listing.
///
/// A cursor is never advanced in place; [`PageCursor::next`] builds the
/// cursor for the following page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Search query restricting the listed messages.
    pub query: Option<String>,
    /// Opaque continuation token from the previous page.
    pub page_token: Option<String>,
    /// Maximum number of identifiers to request.
    pub page_size: u32,
}

impl PageCursor {
    /// Creates the cursor for the first page of a listing.
    ///
    /// An empty query is treated the same as no query.
    pub fn first(query: Option<&str>) -> Self {
        Self {
            query: query.filter(|q| !q.is_empty()).map(str::to_owned),
            page_token: None,
            page_size: UNBOUNDED_PAGE_SIZE,
        }
    }

    /// Creates the cursor for the page following this one.
    pub fn next(&self, token: impl Into<String>) -> Self {
        Self {
            query: self.query.clone(),
            page_token: Some(token.into()),
            page_size: self.page_size,
        }
    }
}

/// One batch of message identifiers returned by a listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    /// Identifiers in this batch, in store order.
    pub messages: Vec<MessageId>,
    /// Continuation token, absent on the last page.
    pub next_page_token: Option<String>,
}

impl MessagePage {
    /// Returns the continuation token if it is present and non-empty.
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Trait for message store implementations.
///
/// Implementations handle transport and authentication. Errors from
/// [`list_messages`](Self::list_messages) end a harvest; errors from
/// [`get_message_headers`](Self::get_message_headers) only skip the message.
///
/// # Example
///
/// ```ignore
/// use mailcrawl::providers::email::{MessageStore, PageCursor};
///
/// async fn count_first_page(store: &impl MessageStore) -> Result<usize> {
///     let page = store.list_messages(&PageCursor::first(None)).await?;
///     Ok(page.messages.len())
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Lists one page of message identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Authentication`] or [`StoreError::Connection`]
    /// when the store cannot be reached.
    async fn list_messages(&self, cursor: &PageCursor) -> Result<MessagePage>;

    /// Fetches the headers of a single message, without its body.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the message no longer exists.
    async fn get_message_headers(&self, id: &MessageId) -> Result<Vec<HeaderEntry>>;
}

/// Supplier of bearer tokens for stores that authenticate every request.
///
/// Access tokens expire during long harvests, so a store asks for the
/// current token before each call and for a renewed one when the server
/// rejects it.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a usable access token, renewing it first if it has expired.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Authentication`] if no valid token can be had.
    async fn current_token(&self) -> Result<String>;

    /// Renews the access token after the server rejected it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Authentication`] if renewal is impossible.
    async fn renew_token(&self) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cursor_has_no_token() {
        let cursor = PageCursor::first(Some("from:me"));
        assert_eq!(cursor.query.as_deref(), Some("from:me"));
        assert!(cursor.page_token.is_none());
        assert_eq!(cursor.page_size, UNBOUNDED_PAGE_SIZE);
    }

    #[test]
    fn empty_query_is_dropped() {
        let cursor = PageCursor::first(Some(""));
        assert!(cursor.query.is_none());
    }

    #[test]
    fn next_cursor_keeps_query() {
        let first = PageCursor::first(Some("label:work"));
        let second = first.next("token123");
        assert_eq!(second.query, first.query);
        assert_eq!(second.page_token, Some("token123".to_string()));
        assert!(first.page_token.is_none());
    }

    #[test]
    fn empty_token_is_not_a_continuation() {
        let page = MessagePage {
            messages: vec![MessageId::from("m1")],
            next_page_token: Some(String::new()),
        };
        assert!(page.continuation().is_none());

        let page = MessagePage {
            messages: vec![],
            next_page_token: Some("abc".to_string()),
        };
        assert_eq!(page.continuation(), Some("abc"));
    }

    #[test]
    fn store_error_display() {
        let auth_err = StoreError::Authentication("token expired".to_string());
        assert_eq!(auth_err.to_string(), "authentication failed: token expired");

        let rate_err = StoreError::RateLimited {
            retry_after_secs: Some(60),
        };
        assert!(rate_err.to_string().contains("rate limit"));

        let not_found = StoreError::NotFound("msg-123".to_string());
        assert!(not_found.to_string().contains("not found"));
    }
}
