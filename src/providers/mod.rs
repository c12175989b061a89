//! Remote service provider implementations.
//!
//! - [`email`] - Message stores the harvester reads from (Gmail API)

pub mod email;
