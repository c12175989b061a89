//! Harvest service: the pagination driver.
//!
//! The [`HarvestService`] pages through a [`MessageStore`], fetches the
//! headers of each listed message in turn, and folds every accepted address
//! into a [`ContactTable`].
//!
//! Work is strictly sequential: one page is listed, each of its messages is
//! fetched and folded, then the next page is requested. A failed listing ends
//! the harvest but keeps what was gathered; a failed message fetch only skips
//! that message.

use serde::Serialize;

use super::address_filter::AddressFilter;
use super::contact_table::{ContactTable, FoldOutcome};
use super::header_extractor::extract_addresses;
use crate::domain::HeaderEntry;
use crate::providers::email::{MessageStore, PageCursor, StoreError};

/// Counters describing a finished harvest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HarvestStats {
    /// Listing calls that succeeded.
    pub pages_listed: u64,
    /// Messages counted against the limit, fetched or not.
    pub messages_processed: u64,
    /// Messages whose metadata fetch failed.
    pub fetch_failures: u64,
    /// Addresses parsed from headers, before filtering.
    pub addresses_seen: u64,
    /// Addresses dropped by the filter.
    pub addresses_rejected: u64,
    /// Addresses that were new to the table.
    pub addresses_inserted: u64,
    /// Stored entries whose empty name was filled in.
    pub names_upgraded: u64,
}

/// Outcome of a harvest run.
///
/// A listing failure does not discard the contacts gathered before it; the
/// error is carried alongside them so the caller decides what to emit.
#[derive(Debug)]
pub struct Harvest {
    /// Deduplicated addresses.
    pub contacts: ContactTable,
    /// Run counters.
    pub stats: HarvestStats,
    /// Listing error that cut the run short, if any.
    pub error: Option<StoreError>,
}

impl Harvest {
    /// Returns true if the listing ran to completion or to the limit.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Service harvesting addresses from a message store.
pub struct HarvestService<S: MessageStore> {
    store: S,
    filter: AddressFilter,
}

impl<S: MessageStore> HarvestService<S> {
    /// Creates a new harvest service.
    pub fn new(store: S, filter: AddressFilter) -> Self {
        Self { store, filter }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Harvests addresses from every message matching `query`.
    ///
    /// At most `limit` messages are processed; `None` or `Some(0)` means no
    /// limit. Messages whose fetch fails still count toward the limit.
    pub async fn harvest(&self, query: Option<&str>, limit: Option<u64>) -> Harvest {
        let limit = limit.filter(|&l| l > 0);
        let mut contacts = ContactTable::new();
        let mut stats = HarvestStats::default();
        let mut error = None;

        tracing::info!(query = query.unwrap_or(""), limit = ?limit, "Starting harvest");

        let mut cursor = Some(PageCursor::first(query));
        'pages: while let Some(current) = cursor.take() {
            let page = match self.store.list_messages(&current).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(page = stats.pages_listed + 1, error = %e, "Listing failed, stopping harvest");
                    error = Some(e);
                    break;
                }
            };
            stats.pages_listed += 1;

            if stats.pages_listed == 1 && page.messages.is_empty() {
                tracing::info!("No messages found");
            }
            tracing::info!(
                page = stats.pages_listed,
                messages = page.messages.len(),
                "Listed page"
            );

            for id in &page.messages {
                if limit_reached(limit, stats.messages_processed) {
                    break 'pages;
                }
                stats.messages_processed += 1;

                match self.store.get_message_headers(id).await {
                    Ok(headers) => {
                        tracing::debug!(message_id = %id, headers = headers.len(), "Fetched message");
                        self.fold_headers(&headers, &mut contacts, &mut stats);
                    }
                    Err(e) => {
                        tracing::warn!(message_id = %id, error = %e, "Skipping message");
                        stats.fetch_failures += 1;
                    }
                }
            }

            if limit_reached(limit, stats.messages_processed) {
                break;
            }
            cursor = page.continuation().map(|token| current.next(token));
        }

        tracing::info!(
            pages = stats.pages_listed,
            messages = stats.messages_processed,
            failures = stats.fetch_failures,
            contacts = contacts.len(),
            "Harvest finished"
        );

        Harvest {
            contacts,
            stats,
            error,
        }
    }

    /// Runs one message's headers through extraction, filtering and merging.
    fn fold_headers(
        &self,
        headers: &[HeaderEntry],
        contacts: &mut ContactTable,
        stats: &mut HarvestStats,
    ) {
        for address in extract_addresses(headers) {
            stats.addresses_seen += 1;
            if !self.filter.accept(&address.address) {
                stats.addresses_rejected += 1;
                continue;
            }
            match contacts.fold(address) {
                FoldOutcome::Inserted => stats.addresses_inserted += 1,
                FoldOutcome::NameUpgraded => stats.names_upgraded += 1,
                FoldOutcome::Unchanged => {}
            }
        }
    }
}

fn limit_reached(limit: Option<u64>, processed: u64) -> bool {
    limit.is_some_and(|l| processed >= l)
}
