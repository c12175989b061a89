//! Harvesting services layer.
//!
//! This module contains the harvesting pipeline, coordinating between the
//! message store provider and the in-memory contact table.
//!
//! # Architecture
//!
//! ```text
//!  MessageStore (list page) ──> MessageStore (fetch headers)
//!                                        |
//!                                        v
//!                             header_extractor (parse)
//!                                        |
//!                                        v
//!                              AddressFilter (accept?)
//!                                        |
//!                                        v
//!                              ContactTable (fold) ──> export
//! ```
//!
//! # Services Overview
//!
//! - [`HarvestService`]: Pages through the store and drives the pipeline
//! - [`AddressFilter`]: Blacklist / whitelist predicate
//! - [`ContactTable`]: Case-insensitive merge accumulator
//! - [`write_contacts`]: Emits the final table

mod address_filter;
mod contact_table;
mod export;
mod harvest_service;
mod header_extractor;

pub use address_filter::AddressFilter;
pub use contact_table::{ContactTable, FoldOutcome};
pub use export::{write_contacts, OutputFormat};
pub use harvest_service::{Harvest, HarvestService, HarvestStats};
pub use header_extractor::{extract_addresses, is_address_header, ADDRESS_HEADERS};
