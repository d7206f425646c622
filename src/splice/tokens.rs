// CLASSIFICATION: COMMUNITY
// Filename: tokens.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Resource tokens inside a statement.
//!
//! Three forms are recognized:
//! - `rN =` at the start of a statement (definition)
//! - `<rN=>` anywhere (inline definition)
//! - `rN` followed by `,` `)` `}` or `]` (use)
//!
//! A token never starts in the middle of an identifier, so `r1` is not
//! found inside `sendr1(` and `r1` never matches the head of `r10`.
//! Quoted literals are skipped wholesale.

use super::scan::split_head;
use super::SpliceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Prefix,
    Inline,
    Use,
}

/// Resource token located by byte range of its digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub id: u64,
    pub role: Role,
}

fn parse_id(digits: &str, stmt: &str) -> Result<u64, SpliceError> {
    digits
        .parse()
        .map_err(|_| SpliceError::ResourceNumber(stmt.to_owned()))
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'@')
}

fn skip_quoted(bytes: &[u8], open: usize) -> usize {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// All resource tokens of `stmt` in textual order.
pub fn scan(stmt: &str) -> Result<Vec<Token>, SpliceError> {
    let mut tokens = Vec::new();
    let head = split_head(stmt);
    if let Some(digits) = head.def {
        tokens.push(Token {
            start: head.def_at,
            end: head.def_at + digits.len(),
            id: parse_id(digits, stmt)?,
            role: Role::Prefix,
        });
    }

    let bytes = stmt.as_bytes();
    let mut i = head.body_at;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = skip_quoted(bytes, i);
                continue;
            }
            b'r' if i == 0 || !is_ident(bytes[i - 1]) => {}
            _ => {
                i += 1;
                continue;
            }
        }
        let start = i + 1;
        let end = start + bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count();
        if end == start {
            i += 1;
            continue;
        }
        let role = if start >= 2 && bytes[start - 2] == b'<' && bytes[end..].starts_with(b"=>") {
            Some(Role::Inline)
        } else if matches!(bytes.get(end), Some(b',' | b')' | b'}' | b']')) {
            Some(Role::Use)
        } else {
            None
        };
        if let Some(role) = role {
            tokens.push(Token {
                start,
                end,
                id: parse_id(&stmt[start..end], stmt)?,
                role,
            });
        }
        i = end;
    }
    Ok(tokens)
}

/// Ids defined by `stmt`: the prefix first, then inline definitions.
pub fn defined_ids(stmt: &str) -> Result<Vec<u64>, SpliceError> {
    Ok(scan(stmt)?
        .into_iter()
        .filter(|t| t.role != Role::Use)
        .map(|t| t.id)
        .collect())
}

/// Ids bound by `<rN=>` markers only.
pub fn inline_ids(stmt: &str) -> Result<Vec<u64>, SpliceError> {
    Ok(scan(stmt)?
        .into_iter()
        .filter(|t| t.role == Role::Inline)
        .map(|t| t.id)
        .collect())
}

/// Replace every token's number with `remap(token)`.
pub fn rewrite<F>(stmt: &str, mut remap: F) -> Result<String, SpliceError>
where
    F: FnMut(&Token) -> Result<u64, SpliceError>,
{
    let mut out = String::with_capacity(stmt.len() + 4);
    let mut last = 0;
    for token in scan(stmt)? {
        out.push_str(&stmt[last..token.start]);
        out.push_str(&remap(&token)?.to_string());
        last = token.end;
    }
    out.push_str(&stmt[last..]);
    Ok(out)
}

/// Shift every id `>= base` by `offset`.
pub fn shift(stmt: &str, base: u64, offset: u64) -> Result<String, SpliceError> {
    rewrite(stmt, |t| {
        if t.id < base {
            return Ok(t.id);
        }
        t.id
            .checked_add(offset)
            .ok_or_else(|| SpliceError::ResourceNumber(stmt.to_owned()))
    })
}

/// One past the highest id defined by `calls`, or 0 if none are.
pub fn next_resource(calls: &[String]) -> Result<u64, SpliceError> {
    let mut next = 0;
    for stmt in calls {
        if let Some(max) = defined_ids(stmt)?.into_iter().max() {
            let after = max
                .checked_add(1)
                .ok_or_else(|| SpliceError::ResourceNumber(stmt.clone()))?;
            next = next.max(after);
        }
    }
    Ok(next)
}
