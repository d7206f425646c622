// CLASSIFICATION: COMMUNITY
// Filename: table.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Address-table bootstrap.
//!
//! The table is a text file with one `<call-name> <base-decimal>` pair per
//! line. Malformed lines are reported and skipped.

use std::fs;
use std::path::Path;

use log::{info, warn};

use super::{AddrError, AddressBook};

/// Reserved bucket recorded past the highest known base.
pub const UNKNOWN_CALL: &str = "[UNK]";

/// Gap between the highest known base and the reserved bucket.
const UNKNOWN_MARGIN: u64 = 0x80;

/// Parse table text into `(call, base)` pairs, skipping malformed lines.
pub fn parse_address_table(text: &str) -> Vec<(String, u64)> {
    let mut entries = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(' ').collect();
        let [name, value] = parts.as_slice() else {
            warn!("invalid address table line: {line:?}");
            continue;
        };
        match value.parse::<u64>() {
            Ok(base) => entries.push((name.to_string(), base)),
            Err(e) => warn!("bad base address for {name}: {e}"),
        }
    }
    entries
}

/// Populate `book` from the table at `path`. Returns the number of calls loaded.
pub fn load_address_table(path: &Path, book: &AddressBook) -> Result<usize, AddrError> {
    let text = fs::read_to_string(path).map_err(|source| AddrError::Table {
        path: path.display().to_string(),
        source,
    })?;
    let entries = parse_address_table(&text);
    let mut max_base = 0u64;
    for (name, base) in &entries {
        max_base = max_base.max(*base);
        book.register(name, *base)?;
    }
    book.register(UNKNOWN_CALL, max_base + UNKNOWN_MARGIN)?;
    info!("address table loaded: {} calls from {}", entries.len(), path.display());
    Ok(entries.len())
}
