//! Writing harvested contacts out.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use super::contact_table::ContactTable;

/// Output format for harvested contacts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `"<address> <name>"` line per contact.
    #[default]
    Text,
    /// A JSON array of `{address, name}` objects.
    Json,
}

/// Writes the contacts in key order using the given format.
pub fn write_contacts<W: Write>(
    out: &mut W,
    contacts: &ContactTable,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            for address in contacts.addresses() {
                writeln!(out, "{} {}", address.address, address.name)?;
            }
        }
        OutputFormat::Json => {
            let entries: Vec<_> = contacts.addresses().collect();
            serde_json::to_writer_pretty(&mut *out, &entries)?;
            writeln!(out)?;
        }
    }
    out.flush()
}
