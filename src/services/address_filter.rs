//! Blacklist / whitelist filtering of harvested addresses.

use regex::Regex;

use crate::config::ConfigError;

/// Regex pair deciding which addresses are kept.
///
/// The blacklist is consulted first: an address it matches is always
/// rejected, even if the whitelist matches too. When a whitelist is present,
/// only addresses it matches survive. Matching is an unanchored search on the
/// raw address and is case-sensitive unless the pattern says otherwise.
#[derive(Debug, Clone, Default)]
pub struct AddressFilter {
    blacklist: Option<Regex>,
    whitelist: Option<Regex>,
}

impl AddressFilter {
    /// Creates a filter that accepts every address.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Compiles a filter from optional pattern sources.
    ///
    /// Empty patterns are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] naming the offending pattern
    /// if either fails to compile.
    pub fn new(blacklist: Option<&str>, whitelist: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            blacklist: compile("blacklist", blacklist)?,
            whitelist: compile("whitelist", whitelist)?,
        })
    }

    /// Returns whether a blacklist is configured.
    pub fn has_blacklist(&self) -> bool {
        self.blacklist.is_some()
    }

    /// Returns whether a whitelist is configured.
    pub fn has_whitelist(&self) -> bool {
        self.whitelist.is_some()
    }

    /// Checks whether an address passes the filter.
    pub fn accept(&self, address: &str) -> bool {
        if let Some(ref blacklist) = self.blacklist {
            if blacklist.is_match(address) {
                return false;
            }
        }

        if let Some(ref whitelist) = self.whitelist {
            if !whitelist.is_match(address) {
                return false;
            }
        }

        true
    }
}

fn compile(which: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    match pattern {
        Some(p) if !p.is_empty() => Regex::new(p)
            .map(Some)
            .map_err(|source| ConfigError::InvalidPattern { which, source }),
        _ => Ok(None),
    }
}
