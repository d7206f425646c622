// CLASSIFICATION: COMMUNITY
// Filename: mask.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Masked statement sequences sent to the oracle.

use log::debug;

use crate::addr::AddressBook;
use crate::normalize::{canonicalize_blobs, normalize_prog, Normalized};
use crate::prog::Prog;

/// Placeholder marking the slot the oracle should fill.
pub const MASK: &str = "[MASK]";

/// Index-aligned statement lists with [`MASK`] at the insertion point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedSequences {
    /// Canonicalized form, used as the oracle query.
    pub normalized: Vec<String>,
    /// Literal form, used for splicing.
    pub raw: Vec<String>,
}

/// Insert [`MASK`] at `position`, appending when it is past the end.
pub fn insert_mask(statements: &mut Vec<String>, position: usize) {
    let at = position.min(statements.len());
    statements.insert(at, MASK.to_owned());
}

/// Build both masked sequences for `prog`.
///
/// The normalized form falls back to the raw serialization when
/// normalization gives up on the program.
pub fn build_masked_sequences(prog: &Prog, position: usize, book: &AddressBook) -> MaskedSequences {
    let mut raw = prog.statements();
    let normalized = match normalize_prog(prog, book) {
        Normalized::Success(p) => p.serialize(),
        Normalized::Unchanged(p) => {
            debug!("masking with unnormalized program");
            p.serialize()
        }
    };
    let mut normalized = crate::prog::encoding::statement_list(&canonicalize_blobs(&normalized));
    insert_mask(&mut raw, position);
    insert_mask(&mut normalized, position);
    MaskedSequences { normalized, raw }
}
