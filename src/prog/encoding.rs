// CLASSIFICATION: COMMUNITY
// Filename: encoding.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Textual serializer for structured programs.
//!
//! Produces one call statement per line in the host's program syntax:
//! `r0 = openat(0xffffffffffffff9c, &(0x7f0000000000)='./file0\x00', 0x0, 0x0)`.

use std::fmt::Write;

use super::{Arg, Call, DataArg, GroupKind, Payload, Prog, ResultArg};

/// Trailing zero bytes beyond this count are folded into a `/0xN` size suffix.
const ZERO_TAIL_FOLD: usize = 8;

impl Prog {
    /// Serialize the program, one statement per line, each line newline-terminated.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for call in &self.calls {
            out.push_str(&serialize_call(call));
            out.push('\n');
        }
        out
    }

    /// Serialized statements as an ordered list.
    pub fn statements(&self) -> Vec<String> {
        statement_list(&self.serialize())
    }
}

/// Split serialized program text into statements, dropping trailing blank entries.
pub fn statement_list(text: &str) -> Vec<String> {
    let mut list: Vec<String> = text.split('\n').map(str::to_owned).collect();
    while list.last().is_some_and(|s| s.is_empty()) {
        list.pop();
    }
    list
}

/// Serialize a single call statement.
pub fn serialize_call(call: &Call) -> String {
    let mut out = String::new();
    if let Some(id) = call.ret {
        let _ = write!(out, "r{id} = ");
    }
    out.push_str(&call.meta.name);
    out.push('(');
    for (i, arg) in call.args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_arg(&mut out, arg);
    }
    out.push(')');
    out
}

fn write_arg(out: &mut String, arg: &Arg) {
    match arg {
        Arg::Const(c) => {
            let _ = write!(out, "0x{:x}", c.val);
        }
        Arg::Data(d) => write_data(out, d),
        Arg::Pointer(p) => {
            let _ = write!(out, "&(0x{:x})=", p.address);
            match &p.pointee {
                Some(inner) => write_arg(out, inner),
                None => out.push_str("nil"),
            }
        }
        Arg::Group(g) => {
            let (open, close) = match g.kind {
                GroupKind::Struct => ('{', '}'),
                GroupKind::Array => ('[', ']'),
            };
            out.push(open);
            for (i, inner) in g.inner.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_arg(out, inner);
            }
            out.push(close);
        }
        Arg::Union(u) => {
            let _ = write!(out, "@{}=", u.option_name);
            write_arg(out, &u.option);
        }
        Arg::Result(r) => write_result(out, r),
    }
}

fn write_result(out: &mut String, r: &ResultArg) {
    if let Some(id) = r.uses {
        let _ = write!(out, "r{id}");
    } else if let Some(id) = r.defines {
        let _ = write!(out, "<r{id}=>0x{:x}", r.val);
    } else {
        let _ = write!(out, "0x{:x}", r.val);
    }
}

fn write_data(out: &mut String, d: &DataArg) {
    let bytes = match &d.payload {
        Payload::Output(size) => {
            let _ = write!(out, "\"\"/0x{size:x}");
            return;
        }
        Payload::Bytes(b) => b,
    };
    let kept = bytes.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    let folded = bytes.len() - kept > ZERO_TAIL_FOLD;
    let body = if folded { &bytes[..kept] } else { &bytes[..] };
    if body.is_empty() {
        out.push_str("\"\"");
    } else if is_readable(body) {
        out.push('\'');
        for &b in body {
            match b {
                b'\'' | b'\\' => {
                    out.push('\\');
                    out.push(b as char);
                }
                0x20..=0x7e => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\x{b:02x}");
                }
            }
        }
        out.push('\'');
    } else {
        out.push('"');
        out.push_str(&hex::encode(body));
        out.push('"');
    }
    if folded {
        let _ = write!(out, "/0x{:x}", bytes.len());
    }
}

fn is_readable(data: &[u8]) -> bool {
    data.iter()
        .all(|&b| (0x20..=0x7e).contains(&b) || matches!(b, 0 | b'\n' | b'\t'))
}
