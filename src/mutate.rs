// CLASSIFICATION: COMMUNITY
// Filename: mutate.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Oracle-guided call insertion.
//!
//! One attempt runs mask → oracle → splice → host parse → choice gate. The
//! attempt has no side effects on the input program; every soft failure
//! yields the original calls.

use std::sync::Arc;

use log::{error, info, warn};

use crate::addr::AddressBook;
use crate::choice::{enable_calls, ChoiceTable};
use crate::error::EngineError;
use crate::mask::{build_masked_sequences, insert_mask};
use crate::meta::CallMetaCache;
use crate::oracle::Oracle;
use crate::prog::encoding::statement_list;
use crate::prog::{Call, Prog, ProgramParser};
use crate::splice::{scan::call_name, splice, SpliceError};

/// Shared services for mutation workers. Cheap to clone.
#[derive(Clone)]
pub struct Mutator {
    book: Arc<AddressBook>,
    oracle: Arc<dyn Oracle>,
    parser: Arc<dyn ProgramParser>,
    meta: Option<Arc<CallMetaCache>>,
}

impl Mutator {
    pub fn new(
        book: Arc<AddressBook>,
        oracle: Arc<dyn Oracle>,
        parser: Arc<dyn ProgramParser>,
    ) -> Self {
        Self {
            book,
            oracle,
            parser,
            meta: None,
        }
    }

    /// Reject proposals naming calls the cache does not know.
    pub fn with_meta_cache(mut self, cache: Arc<CallMetaCache>) -> Self {
        self.meta = Some(cache);
        self
    }

    /// Ask the oracle for a call to insert at `position` and splice it in.
    pub fn mutate_with_oracle(
        &self,
        prog: &Prog,
        position: usize,
        table: &mut dyn ChoiceTable,
    ) -> Result<Vec<Call>, EngineError> {
        let position = position.min(prog.calls.len());
        let masked = build_masked_sequences(prog, position, &self.book);

        let proposal = match self.oracle.propose(&masked.normalized) {
            Ok(resp) => match resp.proposal() {
                Some(p) => p.to_owned(),
                None => return Ok(prog.calls.clone()),
            },
            Err(e) => {
                warn!("oracle query failed: {e}");
                return Ok(prog.calls.clone());
            }
        };

        if let (Some(cache), Some(name)) = (&self.meta, call_name(&proposal)) {
            if cache.get(name)?.is_none() {
                warn!("oracle proposed unknown call {name}");
                return Ok(prog.calls.clone());
            }
        }

        let spliced = splice(&proposal, &masked.raw, position).map_err(|e| {
            error!("splice failed for {proposal:?}: {e}");
            e
        })?;

        let text = spliced.join("\n") + "\n";
        let mut mutated = match self.parser.deserialize(&text) {
            Ok(p) => p,
            Err(e) => {
                warn!("spliced program rejected by host: {e}");
                return Ok(prog.calls.clone());
            }
        };
        enable_calls(&mut mutated, table);
        info!(
            "inserted call at {position}: {} -> {} calls",
            prog.calls.len(),
            mutated.calls.len()
        );
        Ok(mutated.calls)
    }
}

/// Splice `proposal` into textual `program` at `position`.
pub fn splice_text(program: &str, position: usize, proposal: &str) -> Result<Vec<String>, SpliceError> {
    let mut statements = statement_list(program);
    let position = position.min(statements.len());
    insert_mask(&mut statements, position);
    splice(proposal, &statements, position)
}

/// Query `oracle` with the raw masked text program and splice its answer.
///
/// Soft failures return the original statements.
pub fn query_text(
    oracle: &dyn Oracle,
    program: &str,
    position: usize,
) -> Result<Vec<String>, EngineError> {
    let original = statement_list(program);
    let position = position.min(original.len());
    let mut masked = original.clone();
    insert_mask(&mut masked, position);
    let proposal = match oracle.propose(&masked) {
        Ok(resp) => match resp.proposal() {
            Some(p) => p.to_owned(),
            None => return Ok(original),
        },
        Err(e) => {
            warn!("oracle query failed: {e}");
            return Ok(original);
        }
    };
    splice(&proposal, &masked, position).map_err(|e| {
        error!("splice failed for {proposal:?}: {e}");
        EngineError::Splice(e)
    })
}
