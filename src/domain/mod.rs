//! Domain layer types for the harvester.
//!
//! This module contains the value types that flow through the harvesting
//! pipeline: message identifiers, raw headers, and parsed addresses.

mod address;
mod message;
mod types;

pub use address::{normalize, Address};
pub use message::HeaderEntry;
pub use types::MessageId;
