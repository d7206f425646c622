// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Resource-aware splicing of a proposed call into a serialized program.
//!
//! A proposal may wrap sub-expressions in `@RSTART@..@REND@` (the argument
//! needs one resource produced by that call) or `@PIPESTART@..@PIPEEND@`
//! (the call produces several resources through `<rN=>` markers). Each tag
//! is replaced by a reference to an existing provider before the insertion
//! point, or to a provider hoisted directly in front of the proposal.
//! Every id handed out is fresh, and statements after the insertion point
//! are shifted so no reference changes meaning.

pub mod scan;
pub mod tokens;

use std::collections::HashMap;

use log::{debug, trace};
use thiserror::Error;

use scan::{base_name, call_name, parse_tags, split_head, Piece, TagKind};

pub use scan::{
    has_tags, is_resource_defining, PIPE_END, PIPE_START, RESOURCE_END, RESOURCE_START,
};
pub use tokens::next_resource;

/// Fatal splice failures. The caller discards the mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpliceError {
    #[error("malformed call statement: {0:?}")]
    MalformedCall(String),
    #[error("unparseable resource number in {0:?}")]
    ResourceNumber(String),
}

/// Ids bound by one multi-resource provider and how often it was referenced.
struct PipeProvider {
    ids: Vec<u64>,
    uses: usize,
}

impl PipeProvider {
    fn next_reference(&mut self) -> String {
        let id = self.ids[self.uses % self.ids.len()];
        self.uses += 1;
        format!("r{id}")
    }
}

struct Splicer<'a> {
    before: &'a [String],
    base: u64,
    fresh: u64,
    hoisted: Vec<String>,
    pipes: HashMap<String, PipeProvider>,
}

impl<'a> Splicer<'a> {
    fn new(before: &'a [String]) -> Result<Self, SpliceError> {
        Ok(Self {
            before,
            base: next_resource(before)?,
            fresh: 0,
            hoisted: Vec::new(),
            pipes: HashMap::new(),
        })
    }

    fn fresh_id(&mut self, stmt: &str) -> Result<u64, SpliceError> {
        let id = self
            .base
            .checked_add(self.fresh)
            .ok_or_else(|| SpliceError::ResourceNumber(stmt.to_owned()))?;
        self.fresh += 1;
        Ok(id)
    }

    fn resolve(&mut self, pieces: &[Piece]) -> Result<String, SpliceError> {
        let mut out = String::new();
        for piece in pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Tagged { kind, body } => {
                    let reference = match kind {
                        TagKind::Resource => self.single(body)?,
                        TagKind::Pipe => self.pipe(body)?,
                    };
                    out.push_str(&reference);
                }
            }
        }
        Ok(out)
    }

    /// Give every definition in `stmt` accepted by `wanted` a fresh id, in
    /// textual order.
    fn claim_where<W>(&mut self, stmt: &str, wanted: W) -> Result<(String, Vec<u64>), SpliceError>
    where
        W: Fn(tokens::Role) -> bool,
    {
        let mut ids = Vec::new();
        let out = tokens::rewrite(stmt, |t| {
            if !wanted(t.role) {
                return Ok(t.id);
            }
            let id = self.fresh_id(stmt)?;
            ids.push(id);
            Ok(id)
        })?;
        Ok((out, ids))
    }

    fn claim(&mut self, stmt: &str) -> Result<(String, Vec<u64>), SpliceError> {
        self.claim_where(stmt, |role| role != tokens::Role::Use)
    }

    fn claim_inline(&mut self, stmt: &str) -> Result<(String, Vec<u64>), SpliceError> {
        self.claim_where(stmt, |role| role == tokens::Role::Inline)
    }

    /// Earliest resource-defining statement calling `name`, falling back
    /// to the earliest one sharing its base name.
    fn existing_single(&self, name: &str) -> Result<Option<u64>, SpliceError> {
        let mut by_base = None;
        for stmt in self.before {
            let Some(digits) = split_head(stmt).def else {
                continue;
            };
            let Some(existing) = call_name(stmt) else {
                continue;
            };
            if existing == name {
                return parse_id(digits, stmt).map(Some);
            }
            if by_base.is_none() && base_name(existing) == base_name(name) {
                by_base = Some((digits, stmt));
            }
        }
        by_base.map(|(d, s)| parse_id(d, s)).transpose()
    }

    /// Reuse decisions are made on the outline, so nested tags are only
    /// resolved when the provider is actually hoisted.
    fn single(&mut self, body: &[Piece]) -> Result<String, SpliceError> {
        let outline = outline(body);
        let name = call_name(outline.trim())
            .ok_or_else(|| SpliceError::MalformedCall(outline.trim().to_owned()))?;
        if let Some(id) = self.existing_single(name)? {
            trace!("reusing r{id} for {name}");
            return Ok(format!("r{id}"));
        }
        self.hoist_single(body)
    }

    fn hoist_single(&mut self, body: &[Piece]) -> Result<String, SpliceError> {
        let embedded = self.resolve(body)?;
        let embedded = embedded.trim();
        let id = self.fresh_id(embedded)?;
        let provider = format!("r{id} = {}", split_head(embedded).body);
        // inline markers inside the provider need their own ids
        let (provider, _) = self.claim_inline(&provider)?;
        debug!("hoisting {provider}");
        self.hoisted.push(provider);
        Ok(format!("r{id}"))
    }

    fn existing_pipe(&self, name: &str, shape: usize) -> Result<Option<Vec<u64>>, SpliceError> {
        for stmt in self.before {
            if call_name(stmt) != Some(name) {
                continue;
            }
            let ids = tokens::inline_ids(stmt)?;
            if ids.len() == shape {
                return Ok(Some(ids));
            }
        }
        Ok(None)
    }

    fn pipe(&mut self, body: &[Piece]) -> Result<String, SpliceError> {
        let outline = outline(body);
        let outline = outline.trim();
        let name = call_name(outline)
            .ok_or_else(|| SpliceError::MalformedCall(outline.to_owned()))?
            .to_owned();
        let shape = tokens::inline_ids(outline)?.len();
        if shape == 0 {
            return self.single(body);
        }
        if let Some(provider) = self.pipes.get_mut(&name) {
            return Ok(provider.next_reference());
        }
        let ids = match self.existing_pipe(&name, shape)? {
            Some(ids) => {
                trace!("reusing {name} outputs {ids:?}");
                ids
            }
            None => {
                let embedded = self.resolve(body)?;
                let (provider, ids) = self.claim_inline(split_head(embedded.trim()).body)?;
                debug!("hoisting {provider}");
                self.hoisted.push(provider);
                ids
            }
        };
        let mut provider = PipeProvider { ids, uses: 0 };
        let reference = provider.next_reference();
        self.pipes.insert(name, provider);
        Ok(reference)
    }
}

/// Top-level text of a tag body with nested tags left out.
fn outline(body: &[Piece]) -> String {
    body.iter()
        .filter_map(|p| match p {
            Piece::Text(t) => Some(t.as_str()),
            Piece::Tagged { .. } => None,
        })
        .collect()
}

fn parse_id(digits: &str, stmt: &str) -> Result<u64, SpliceError> {
    digits
        .parse()
        .map_err(|_| SpliceError::ResourceNumber(stmt.to_owned()))
}

/// Splice `proposal` into `calls` at `position`, replacing the statement
/// there.
///
/// Statements before `position` are returned unchanged. Hoisted providers
/// follow, then the resolved proposal, then the remaining statements with
/// every id at or above the first fresh id shifted past the new ones. A
/// position at or past the end appends.
pub fn splice(proposal: &str, calls: &[String], position: usize) -> Result<Vec<String>, SpliceError> {
    let position = position.min(calls.len());
    let mut splicer = Splicer::new(&calls[..position])?;

    let resolved = splicer.resolve(&parse_tags(proposal.trim()))?;
    if call_name(&resolved).is_none() {
        return Err(SpliceError::MalformedCall(resolved));
    }
    let (resolved, own) = splicer.claim(&resolved)?;

    let base = splicer.base;
    let offset = splicer.fresh;
    debug!(
        "spliced at {position}: base r{base}, {} hoisted, own ids {own:?}, shift {offset}",
        splicer.hoisted.len()
    );

    let mut out = Vec::with_capacity(calls.len() + splicer.hoisted.len() + 1);
    out.extend_from_slice(&calls[..position]);
    out.append(&mut splicer.hoisted);
    out.push(resolved);
    for stmt in calls.iter().skip(position + 1) {
        if offset == 0 {
            out.push(stmt.clone());
        } else {
            out.push(tokens::shift(stmt, base, offset)?);
        }
    }
    Ok(out)
}
