//! mailcrawl - Harvests a deduplicated contact list from Gmail message headers
//!
//! This crate provides the harvesting pipeline (paginated listing, header
//! extraction, filtering, and case-insensitive merging) together with the
//! Gmail API store and OAuth plumbing the command-line tool runs it with.

pub mod app;
pub mod auth;
pub mod config;
pub mod domain;
pub mod providers;
pub mod services;

#[cfg(test)]
mod test_support;

pub use app::{run, HarvestError};
