//! Message store implementations.
//!
//! This module contains the [`MessageStore`] trait and its Gmail API
//! implementation, [`GmailStore`].
//!
//! # Architecture
//!
//! The harvester talks to the remote mailbox only through [`MessageStore`],
//! which exposes two calls:
//!
//! - listing message identifiers one page at a time
//! - fetching the headers of a single message
//!
//! # Example
//!
//! ```ignore
//! use mailcrawl::providers::email::{GmailStore, MessageStore, PageCursor};
//!
//! async fn first_headers(store: &dyn MessageStore) {
//!     let page = store
//!         .list_messages(&PageCursor::first(None))
//!         .await
//!         .expect("failed to list messages");
//!
//!     for id in &page.messages {
//!         let headers = store.get_message_headers(id).await;
//!         println!("{}: {:?}", id, headers);
//!     }
//! }
//! ```

mod gmail;
mod traits;

pub use gmail::GmailStore;
#[cfg(test)]
pub use traits::MockMessageStore;
pub use traits::{
    MessagePage, MessageStore, PageCursor, Result, StoreError, TokenSource, UNBOUNDED_PAGE_SIZE,
};
