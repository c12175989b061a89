//! Message metadata types.

use serde::{Deserialize, Serialize};

/// A single header of a message, as returned by the store's metadata call.
///
/// The value is raw: encoded words and folding are left for the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    /// Header field name, e.g. `From`.
    pub name: String,
    /// Unparsed header value.
    pub value: String,
}

impl HeaderEntry {
    /// Creates a new header entry.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
