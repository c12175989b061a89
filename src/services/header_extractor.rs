//! Extraction of addresses from message headers.
//!
//! Only address-bearing headers are considered. Each value is parsed as an
//! RFC 5322 address list; a value that fails to parse contributes nothing
//! and does not affect the other headers of the same message.

use mailparse::{MailAddr, SingleInfo};
use thiserror::Error;

use crate::domain::{Address, HeaderEntry};

/// Header fields whose values are harvested.
pub const ADDRESS_HEADERS: [&str; 6] = ["From", "To", "Cc", "Bcc", "Delivered-To", "Return-Path"];

/// Returns whether a header field carries addresses worth harvesting.
pub fn is_address_header(name: &str) -> bool {
    ADDRESS_HEADERS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(name))
}

/// Extracts every address found in the recognized headers, in encounter order.
pub fn extract_addresses(headers: &[HeaderEntry]) -> Vec<Address> {
    let mut addresses = Vec::new();

    for header in headers.iter().filter(|h| is_address_header(&h.name)) {
        match parse_address_list(header) {
            Ok(parsed) => addresses.extend(parsed),
            Err(e) => {
                tracing::debug!(header = %header.name, error = %e, "Skipping unparsable header");
            }
        }
    }

    addresses
}

/// Why a header value was not accepted as an address list.
#[derive(Debug, Error)]
enum HeaderParseError {
    #[error(transparent)]
    Syntax(#[from] mailparse::MailParseError),

    #[error("malformed address {0:?}")]
    Malformed(String),
}

/// Parses one header value as an address list.
///
/// Encoded-word display names are decoded; group members are flattened.
/// The whole header is rejected if any element is not a plain
/// `local@domain` address.
fn parse_address_list(header: &HeaderEntry) -> Result<Vec<Address>, HeaderParseError> {
    let line = format!("{}: {}", header.name, drop_empty_elements(&header.value));
    let (parsed, _) = mailparse::parse_header(line.as_bytes())?;
    let list = mailparse::addrparse_header(&parsed)?;

    let mut addresses = Vec::new();
    for addr in list.iter() {
        match addr {
            MailAddr::Single(info) => addresses.extend(to_address(info)?),
            MailAddr::Group(group) => {
                for info in &group.addrs {
                    addresses.extend(to_address(info)?);
                }
            }
        }
    }
    Ok(addresses)
}

/// Removes blank elements (`a@x.com, , b@y.com`) from an address list.
///
/// Commas inside quoted strings, comments and angle brackets are not
/// element separators.
fn drop_empty_elements(value: &str) -> String {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    let mut comment_depth = 0u32;
    let mut in_angle = false;

    for c in value.chars() {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' if quoted || comment_depth > 0 => escaped = true,
            '"' if comment_depth == 0 => quoted = !quoted,
            '(' if !quoted => comment_depth += 1,
            ')' if !quoted && comment_depth > 0 => comment_depth -= 1,
            '<' if !quoted && comment_depth == 0 => in_angle = true,
            '>' if !quoted && comment_depth == 0 => in_angle = false,
            ',' if !quoted && comment_depth == 0 && !in_angle => {
                elements.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    elements.push(current);

    elements
        .into_iter()
        .filter(|e| !e.trim().is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Converts a parsed mailbox, skipping empty ones such as `Return-Path: <>`.
fn to_address(info: &SingleInfo) -> Result<Option<Address>, HeaderParseError> {
    let address = info.addr.trim();
    if address.is_empty() {
        return Ok(None);
    }
    if !is_plain_address(address) {
        return Err(HeaderParseError::Malformed(address.to_string()));
    }
    let name = info.display_name.as_deref().unwrap_or("").trim();
    Ok(Some(Address::with_name(address, name)))
}

/// A single `local@domain` with no whitespace or list separators left in it.
fn is_plain_address(address: &str) -> bool {
    address.matches('@').count() == 1
        && !address.starts_with('@')
        && !address.ends_with('@')
        && !address.contains(|c: char| c.is_whitespace() || c == ',')
}
