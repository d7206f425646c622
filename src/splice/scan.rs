// CLASSIFICATION: COMMUNITY
// Filename: scan.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Scanner for call statements and tag-wrapped sub-expressions.
//!
//! Tags nest, so they are matched with an explicit stack instead of a
//! pattern: the innermost complete pair always wins and an end sentinel
//! that does not close the innermost open tag is ordinary text. Open tags
//! left at the end of input are emitted back as literal text.

/// Opens a single-resource dependency.
pub const RESOURCE_START: &str = "@RSTART@";
/// Closes a single-resource dependency.
pub const RESOURCE_END: &str = "@REND@";
/// Opens a multi-resource (pipe-style) dependency.
pub const PIPE_START: &str = "@PIPESTART@";
/// Closes a multi-resource (pipe-style) dependency.
pub const PIPE_END: &str = "@PIPEEND@";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Resource,
    Pipe,
}

impl TagKind {
    fn start(self) -> &'static str {
        match self {
            TagKind::Resource => RESOURCE_START,
            TagKind::Pipe => PIPE_START,
        }
    }
}

/// Fragment of proposal text.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),
    Tagged { kind: TagKind, body: Vec<Piece> },
}

enum Sentinel {
    Open(TagKind),
    Close(TagKind),
}

fn sentinel_at(rest: &str) -> Option<(Sentinel, usize)> {
    [
        (RESOURCE_START, Sentinel::Open(TagKind::Resource)),
        (RESOURCE_END, Sentinel::Close(TagKind::Resource)),
        (PIPE_START, Sentinel::Open(TagKind::Pipe)),
        (PIPE_END, Sentinel::Close(TagKind::Pipe)),
    ]
    .into_iter()
    .find(|(lit, _)| rest.starts_with(lit))
    .map(|(lit, s)| (s, lit.len()))
}

fn push_text(pieces: &mut Vec<Piece>, text: &str) {
    if text.is_empty() {
        return;
    }
    match pieces.last_mut() {
        Some(Piece::Text(prev)) => prev.push_str(text),
        _ => pieces.push(Piece::Text(text.to_owned())),
    }
}

/// Split `text` into literal runs and matched tag pairs.
pub fn parse_tags(text: &str) -> Vec<Piece> {
    let mut root = Vec::new();
    let mut open: Vec<(TagKind, Vec<Piece>)> = Vec::new();
    let mut run_start = 0;
    let mut i = 0;

    while i < text.len() {
        let Some((sentinel, len)) = sentinel_at(&text[i..]) else {
            i += text[i..].chars().next().map_or(1, char::len_utf8);
            continue;
        };
        let run = &text[run_start..i];
        match sentinel {
            Sentinel::Open(kind) => {
                let current = open.last_mut().map_or(&mut root, |(_, body)| body);
                push_text(current, run);
                open.push((kind, Vec::new()));
            }
            Sentinel::Close(kind) if open.last().is_some_and(|(k, _)| *k == kind) => {
                if let Some((kind, mut body)) = open.pop() {
                    push_text(&mut body, run);
                    let parent = open.last_mut().map_or(&mut root, |(_, b)| b);
                    parent.push(Piece::Tagged { kind, body });
                }
            }
            Sentinel::Close(_) => {
                // stray close: keep it in the current literal run
                i += len;
                continue;
            }
        }
        i += len;
        run_start = i;
    }

    let current = open.last_mut().map_or(&mut root, |(_, body)| body);
    push_text(current, &text[run_start..]);
    while let Some((kind, body)) = open.pop() {
        let parent = open.last_mut().map_or(&mut root, |(_, b)| b);
        push_text(parent, kind.start());
        for piece in body {
            match piece {
                Piece::Text(t) => push_text(parent, &t),
                tagged => parent.push(tagged),
            }
        }
    }
    root
}

/// True if `text` holds at least one complete tag pair.
pub fn has_tags(text: &str) -> bool {
    parse_tags(text)
        .iter()
        .any(|p| matches!(p, Piece::Tagged { .. }))
}

/// Statement split into its optional `rN =` definition and the call body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head<'a> {
    /// Digits of the defined resource, if the statement defines one.
    pub def: Option<&'a str>,
    /// Offset of `def` within the statement.
    pub def_at: usize,
    /// Everything after the definition (or the whole statement).
    pub body: &'a str,
    /// Offset of `body` within the statement.
    pub body_at: usize,
}

/// Split off a leading `r<digits> =` definition.
pub fn split_head(stmt: &str) -> Head<'_> {
    let plain = Head {
        def: None,
        def_at: 0,
        body: stmt,
        body_at: 0,
    };
    let bytes = stmt.as_bytes();
    if bytes.first() != Some(&b'r') {
        return plain;
    }
    let digits = bytes[1..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return plain;
    }
    let mut at = 1 + digits;
    while bytes.get(at) == Some(&b' ') {
        at += 1;
    }
    if bytes.get(at) != Some(&b'=') {
        return plain;
    }
    at += 1;
    while bytes.get(at) == Some(&b' ') {
        at += 1;
    }
    Head {
        def: Some(&stmt[1..1 + digits]),
        def_at: 1,
        body: &stmt[at..],
        body_at: at,
    }
}

/// True iff the statement begins with `r<digits> =`.
pub fn is_resource_defining(stmt: &str) -> bool {
    split_head(stmt).def.is_some()
}

/// Name of the called syscall, e.g. `openat$llc` for `r0 = openat$llc(...)`.
pub fn call_name(stmt: &str) -> Option<&str> {
    let body = split_head(stmt.trim_start()).body;
    let len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$'))
        .count();
    if len == 0 || body.as_bytes().get(len) != Some(&b'(') {
        return None;
    }
    Some(&body[..len])
}

/// Syscall name without its `$` variant suffix.
pub fn base_name(name: &str) -> &str {
    name.split('$').next().unwrap_or(name)
}
