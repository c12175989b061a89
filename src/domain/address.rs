//! Address domain type.
//!
//! An [`Address`] is a mailbox found in a message header together with the
//! display name that accompanied it, if any.

use serde::{Deserialize, Serialize};

/// An email address with a possibly empty display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// The address as it appeared in the header (original casing).
    pub address: String,
    /// Display name, empty when the header carried none.
    pub name: String,
}

impl Address {
    /// Creates a new address without a display name.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: String::new(),
        }
    }

    /// Creates a new address with a display name.
    pub fn with_name(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }

    /// Returns whether a display name is present.
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    /// Returns the deduplication key for this address.
    pub fn key(&self) -> String {
        normalize(&self.address)
    }
}

/// Lower-cases an address for identity comparison.
///
/// Only used to build lookup keys; stored addresses keep their casing.
pub fn normalize(address: &str) -> String {
    address.to_lowercase()
}
