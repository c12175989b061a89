//! Core identifier types for domain entities.
//!
//! These newtype wrappers keep provider-assigned identifiers from being mixed
//! up with the free-form strings (addresses, queries, tokens) around them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a message in the remote store.
///
/// Owned by the provider; the harvester only carries it from the listing
/// call to the matching metadata fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_display() {
        let id = MessageId("18c2f0a9d1e".to_string());
        assert_eq!(id.to_string(), "18c2f0a9d1e");
    }

    #[test]
    fn message_id_equality() {
        let id1 = MessageId::from("msg-1");
        let id2 = MessageId::from("msg-1".to_string());
        assert_eq!(id1, id2);
        assert_eq!(id1.as_str(), "msg-1");
    }

    #[test]
    fn message_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(MessageId::from("msg-1"));
        assert!(set.contains(&MessageId::from("msg-1")));
    }
}
