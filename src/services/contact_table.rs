//! Merge accumulator for harvested addresses.
//!
//! The [`ContactTable`] deduplicates addresses case-insensitively. The first
//! address seen for a key keeps its original casing for the rest of the run;
//! the display name may be filled in later but never replaced or cleared.

use std::collections::btree_map::{self, BTreeMap};

use crate::domain::{normalize, Address};

/// What a [`ContactTable::fold`] call did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    /// The address was new and has been inserted.
    Inserted,
    /// The stored entry had no name and took the candidate's.
    NameUpgraded,
    /// The table already held an equal or better entry.
    Unchanged,
}

/// Deduplicated addresses keyed by their normalized form.
///
/// Iteration is ordered by key, so output is deterministic within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactTable {
    entries: BTreeMap<String, Address>,
}

impl ContactTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a candidate address into the table.
    pub fn fold(&mut self, candidate: Address) -> FoldOutcome {
        match self.entries.entry(candidate.key()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(candidate);
                FoldOutcome::Inserted
            }
            btree_map::Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if !existing.has_name() && candidate.has_name() {
                    existing.name = candidate.name;
                    FoldOutcome::NameUpgraded
                } else {
                    FoldOutcome::Unchanged
                }
            }
        }
    }

    /// Looks up an entry by address, ignoring case.
    pub fn get(&self, address: &str) -> Option<&Address> {
        self.entries.get(&normalize(address))
    }

    /// Number of distinct addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been harvested.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, address)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Address)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over stored addresses in key order.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.entries.values()
    }
}

impl Extend<Address> for ContactTable {
    fn extend<I: IntoIterator<Item = Address>>(&mut self, iter: I) {
        for address in iter {
            self.fold(address);
        }
    }
}

impl FromIterator<Address> for ContactTable {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl IntoIterator for ContactTable {
    type Item = Address;
    type IntoIter = btree_map::IntoValues<String, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}
