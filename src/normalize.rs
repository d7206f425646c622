// CLASSIFICATION: COMMUNITY
// Filename: normalize.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Type-directed argument normalization.
//!
//! Rewrites a copy of each call's argument tree so that superficially
//! different values collapse into a small vocabulary before the program is
//! shown to the oracle. The walk is keyed on the argument variant and the
//! declared field type. Resource arguments are never touched.
//!
//! Normalization is best effort. Any schema/argument mismatch the walker
//! cannot handle aborts the whole program and [`normalize_prog`] returns
//! the original program as [`Normalized::Unchanged`].

use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;

use crate::addr::{AddrCursor, AddrError, AddressBook};
use crate::prog::{
    Arg, BufferKind, Call, ConstArg, DataArg, Dir, GroupArg, Payload, PointerArg, Prog, Type,
    UnionArg,
};

/// Canonical filename written into input filename buffers.
pub const CANONICAL_PATH: &[u8] = b"./file0\0";
/// Size of canonical zero and output buffers.
pub const CANONICAL_BUFFER_SIZE: u64 = 0x400;
/// Value written into scalars named `fd`.
pub const INVALID_FD: u64 = u64::MAX;
/// Value written into every other non-flag scalar.
pub const CANONICAL_SCALAR: u64 = 0x111;

const ANYBLOB_PREFIX: &str = "@ANYBLOB=\"";

const CANONICAL_BLOB_HEX: &str = concat!(
    "02000000bf0100000000000000000000ba010000086e000021232948de042774602f36cddb4aa287b3b3312d",
    "91f7fbcd26167f6444b666b5023d6da31997c5864183bb5548c8d5210899d6b5b6d5efcd76ffd06e3e62e26c",
    "761a6047d17f3aed967ad2b9eaceeae2cb7df923371fd5e88cb2109310447fd0b311245765d6097e53a8c17c",
    "c048956f81eae779bb571cacac48a457bd4d0318be01a875d8a9d7039d2c88658fdc197346946806aca29bd5",
    "1e448d160dee6cb1b7154b67078c77c404f67883fdeea217dddce5faf01620da79e102ffa9192e2b0b89fc55",
    "9edd377d1ba0dce6baf4f99d80879756b350f508274acd1cd428d448cf820f4706031e75835813e13b954579",
    "822cabf5c49c204788c967997833ccbf197ef5fe6a6fa3b8cc8808fb8af13058263c1f576dad05236f15a8d4",
    "d9d46f05a2d510e430f553756fd3aae8cba7bac5f2ca2a3eb779f29b0a7fb6cffc073f9c9d76da64ca91814f",
    "1a08c83ab9c767b1f24c59ca4e1fe4e501d3e220cf8146fb7c4a4726a97cd02b93c47222218804eebd1795e9",
    "a389f75da01498ff1e648773fb5f475018227e3181a51afc21c91c366668868d18242d62acd0c19e46a20d7e",
    "2579880633802e262c359e3a2937675d237339e1abeb27f4ae33d12ffeccb69618e6000356b856433cc859be",
    "20e7de9b899d21a99a041c7f689f04c2347549df5412ed2a6fc6f5b8d6d16d81e8474d47ea907603135c43f5",
    "8f8940fe3fecb80e4b03c63159f827ad5aa2c7cd90bde569cd757832446fa385df7c2202b835c30b1d337b42",
    "790ba5e9beb9d4d3b8806e2e978b5db841aff85e17cf8d73874f436bc76f336c123a7cf67e3992ae8f0645bb",
    "88d41b9437ce7593451437a1be6b7208faafad77d91ea449f7421228b7d8883e072c2abaaf80681038e15b69",
    "e0c7f4868f0cd115fd2607f0f5305114595e04359350c6b0580c5311c4dc7f89c86d3184d9fc1f9cc0250968",
    "bad83cc9ae7fa8081a6f47ca9eb7b4697b9c70af9277933c3881ff5fbc5a7264038ce11f170c24009d9d3113",
    "fa537207baacf105949e4ee99074bc199acd0b9c14fc63e77a6f54f90584779ac5d7e88ac1fbbd09f880d91c",
    "25c77570f42a7c1e6e718c40a7591ae419d5ff1cd0362fa4c9fb7ead87ea540ccfe69565abac2a4a3fd7e109",
    "0cdba043c3487c291a6d17cdb50e4ec6e7b0c437527cdecf3fe6e03727ecbb1c0284466431d782dd35c30642",
    "8e3880379de2c4f47301e5d498035abd0b7a92da78aacfbf91a8ce711ab8cbedfbf45f934d31d15668712873",
    "041bb7972b65e807912306e736e08fa8570afef98bcd20c5b627dfa990ff78f1381398bfa0594ab42c002343",
    "45463df635fc7f4b5eea378497c53205306e27ae120a903570cdf6ff063797c84f78ded9a4e5a8a6dd40e029",
    "5a670624bf2c1e81d4b48a6d904b36accc0f09fdc24d1bfc31c84a9a9e10b2d7b11c78bd5945b0ffdc38f4cd",
    "ec08c53670340cc778c7ac80bf5a36ca4b618f39b66db6f7a9b7d553af0d68ff41e2fcce96d6fd41373ead8b",
    "1d827e97cb281e2e78380e5e8e340d392e60f3125eed1295b07726c74aaebfd35fc927de7613a4c967054b78",
    "be29fe2f38d78ad4d24b1dea04125bf738e2a46ab415265d75403e9ef7ab2612389d4d",
);

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("{call}: {args} arguments but {fields} declared fields")]
    ArgCount {
        call: String,
        args: usize,
        fields: usize,
    },
    #[error("union option {index} out of range ({variants} declared variants)")]
    UnionIndex { index: usize, variants: usize },
    #[error("expected {expected} type, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Addr(#[from] AddrError),
}

type NormalizeResult<T> = Result<T, NormalizeError>;

/// Outcome of [`normalize_prog`].
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Every call was rewritten.
    Success(Prog),
    /// Normalization was abandoned; this is the untouched input.
    Unchanged(Prog),
}

impl Normalized {
    pub fn is_success(&self) -> bool {
        matches!(self, Normalized::Success(_))
    }

    pub fn into_prog(self) -> Prog {
        match self {
            Normalized::Success(p) | Normalized::Unchanged(p) => p,
        }
    }
}

/// Normalize a copy of `prog`, falling back to the original on any mismatch.
pub fn normalize_prog(prog: &Prog, book: &AddressBook) -> Normalized {
    let mut copy = prog.clone();
    for (idx, call) in copy.calls.iter_mut().enumerate() {
        if let Err(e) = normalize_call(call, book) {
            warn!("normalization abandoned at call {idx} ({}): {e}", call.meta.name);
            return Normalized::Unchanged(prog.clone());
        }
    }
    Normalized::Success(copy)
}

/// Normalize one call in place against a private address cursor.
pub fn normalize_call(call: &mut Call, book: &AddressBook) -> NormalizeResult<()> {
    let meta = Arc::clone(&call.meta);
    if call.args.len() != meta.args.len() {
        return Err(NormalizeError::ArgCount {
            call: meta.name.clone(),
            args: call.args.len(),
            fields: meta.args.len(),
        });
    }
    let mut walker = ArgNormalizer {
        call_name: &meta.name,
        cursor: book.cursor()?,
    };
    for (arg, field) in call.args.iter_mut().zip(&meta.args) {
        walker.walk(arg, &field.ty, &field.name)?;
    }
    Ok(())
}

struct ArgNormalizer<'a> {
    call_name: &'a str,
    cursor: AddrCursor<'a>,
}

impl ArgNormalizer<'_> {
    fn walk(&mut self, arg: &mut Arg, ty: &Type, name: &str) -> NormalizeResult<()> {
        match arg {
            Arg::Data(d) => self.data(d, ty),
            Arg::Const(c) => {
                constant(c, ty, name);
                Ok(())
            }
            Arg::Union(u) => self.union(u, ty),
            Arg::Pointer(p) => self.pointer(p, ty),
            Arg::Group(g) => self.group(g, ty),
            // Resource identity feeds dataflow.
            Arg::Result(_) => Ok(()),
        }
    }

    fn data(&mut self, d: &mut DataArg, ty: &Type) -> NormalizeResult<()> {
        match d.dir {
            Dir::Out => d.payload = Payload::Output(CANONICAL_BUFFER_SIZE),
            Dir::In => {
                let Type::Buffer { kind, values } = ty else {
                    return Err(mismatch("buffer", ty));
                };
                let bytes = if *kind == BufferKind::Filename {
                    CANONICAL_PATH.to_vec()
                } else if let Some(first) = values.first() {
                    first.as_bytes().to_vec()
                } else {
                    vec![0u8; CANONICAL_BUFFER_SIZE as usize]
                };
                d.payload = Payload::Bytes(bytes);
            }
            Dir::InOut => {}
        }
        Ok(())
    }

    fn union(&mut self, u: &mut UnionArg, ty: &Type) -> NormalizeResult<()> {
        let Type::Union { fields } = ty else {
            return Err(mismatch("union", ty));
        };
        let field = fields.get(u.index).ok_or(NormalizeError::UnionIndex {
            index: u.index,
            variants: fields.len(),
        })?;
        self.walk(&mut u.option, &field.ty, &field.name)
    }

    fn group(&mut self, g: &mut GroupArg, ty: &Type) -> NormalizeResult<()> {
        let Type::Struct { fields } = ty else {
            return Ok(());
        };
        if g.inner.len() != fields.len() {
            debug!(
                "{}: struct has {} children but {} fields, left as is",
                self.call_name,
                g.inner.len(),
                fields.len()
            );
            return Ok(());
        }
        for (child, field) in g.inner.iter_mut().zip(fields) {
            self.walk(child, &field.ty, &field.name)?;
        }
        Ok(())
    }

    fn pointer(&mut self, p: &mut PointerArg, ty: &Type) -> NormalizeResult<()> {
        if let Some(addr) = self.next_address()? {
            p.address = addr;
        }
        if let (Type::Ptr { elem }, Some(inner)) = (ty, p.pointee.as_deref_mut()) {
            self.walk(inner, elem, "")?;
        }
        Ok(())
    }

    /// Exact call name only; an unregistered name keeps the old address.
    fn next_address(&mut self) -> NormalizeResult<Option<u64>> {
        Ok(self.cursor.allocate(self.call_name)?)
    }
}

fn constant(c: &mut ConstArg, ty: &Type, name: &str) {
    if matches!(ty, Type::Flags) || name == "mode" {
        return;
    }
    c.val = if name == "fd" {
        INVALID_FD
    } else {
        CANONICAL_SCALAR
    };
}

fn mismatch(expected: &'static str, found: &Type) -> NormalizeError {
    NormalizeError::TypeMismatch {
        expected,
        found: type_kind(found),
    }
}

fn type_kind(ty: &Type) -> &'static str {
    match ty {
        Type::Int => "int",
        Type::Flags => "flags",
        Type::Resource { .. } => "resource",
        Type::Buffer { .. } => "buffer",
        Type::Ptr { .. } => "ptr",
        Type::Struct { .. } => "struct",
        Type::Union { .. } => "union",
        Type::Array { .. } => "array",
    }
}

/// The canonical blob literal, `@ANYBLOB="<hex>"`.
pub fn canonical_blob() -> String {
    format!("{ANYBLOB_PREFIX}{CANONICAL_BLOB_HEX}\"")
}

/// Replace every `@ANYBLOB="<alnum>"` literal in `text` with the canonical blob.
pub fn canonicalize_blobs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(ANYBLOB_PREFIX) {
        out.push_str(&rest[..start]);
        let after = &rest[start + ANYBLOB_PREFIX.len()..];
        let run = after
            .bytes()
            .take_while(u8::is_ascii_alphanumeric)
            .count();
        if run > 0 && after[run..].starts_with('"') {
            out.push_str(&canonical_blob());
            rest = &after[run + 1..];
        } else {
            out.push_str(ANYBLOB_PREFIX);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prog::{Field, ResultArg, Syscall};

    fn field(name: &str, ty: Type) -> Field {
        Field::new(name, ty, Dir::In)
    }

    fn blob() -> Type {
        Type::Buffer {
            kind: BufferKind::Blob,
            values: vec![],
        }
    }

    fn ptr(elem: Type) -> Type {
        Type::Ptr {
            elem: Box::new(elem),
        }
    }

    fn call(name: &str, fields: Vec<Field>, args: Vec<Arg>) -> Call {
        Call::new(
            Arc::new(Syscall {
                id: 0,
                name: name.into(),
                args: fields,
                returns_resource: false,
            }),
            args,
        )
    }

    #[test]
    fn scalars_follow_field_names_and_flags() {
        let c = call(
            "openat",
            vec![
                field("fd", Type::Int),
                field("flags", Type::Flags),
                field("mode", Type::Int),
                field("len", Type::Int),
            ],
            vec![
                Arg::constant(3),
                Arg::constant(0x42),
                Arg::constant(0o644),
                Arg::constant(17),
            ],
        );
        let book = AddressBook::new();
        let out = normalize_prog(&Prog::new(vec![c]), &book);
        assert!(out.is_success());
        let args = &out.into_prog().calls[0].args;
        assert_eq!(args[0], Arg::constant(INVALID_FD));
        assert_eq!(args[1], Arg::constant(0x42));
        assert_eq!(args[2], Arg::constant(0o644));
        assert_eq!(args[3], Arg::constant(CANONICAL_SCALAR));
    }

    #[test]
    fn buffers_collapse_by_direction_and_kind() {
        let filename = Type::Buffer {
            kind: BufferKind::Filename,
            values: vec![],
        };
        let strings = Type::Buffer {
            kind: BufferKind::String,
            values: vec!["lo\0".into(), "eth0\0".into()],
        };
        let c = call(
            "mount",
            vec![
                field("path", ptr(filename)),
                field("dev", ptr(strings)),
                field("data", ptr(blob())),
                field("out", ptr(blob())),
            ],
            vec![
                Arg::pointer(0x10, Some(Arg::Data(DataArg::input(*b"/etc/passwd\0")))),
                Arg::pointer(0x20, Some(Arg::Data(DataArg::input(*b"eth0\0")))),
                Arg::pointer(0x30, Some(Arg::Data(DataArg::input(vec![1, 2, 3])))),
                Arg::pointer(0x40, Some(Arg::Data(DataArg::output(7)))),
            ],
        );
        let out = normalize_prog(&Prog::new(vec![c]), &AddressBook::new()).into_prog();
        let pointee = |i: usize| match &out.calls[0].args[i] {
            Arg::Pointer(p) => p.pointee.as_deref().cloned().unwrap(),
            other => panic!("not a pointer: {other:?}"),
        };
        assert_eq!(pointee(0), Arg::Data(DataArg::input(CANONICAL_PATH)));
        assert_eq!(pointee(1), Arg::Data(DataArg::input(*b"lo\0")));
        assert_eq!(pointee(2), Arg::Data(DataArg::input(vec![0u8; 0x400])));
        assert_eq!(pointee(3), Arg::Data(DataArg::output(CANONICAL_BUFFER_SIZE)));
    }

    #[test]
    fn pointers_take_book_addresses_per_call() {
        let book = AddressBook::new();
        book.register("sendto$llc", 0x7f0000010000).unwrap();
        let c = || {
            call(
                "sendto$llc",
                vec![field("buf", ptr(blob())), field("addr", ptr(blob()))],
                vec![
                    Arg::pointer(0x1, Some(Arg::Data(DataArg::input(vec![9])))),
                    Arg::pointer(0x2, None),
                ],
            )
        };
        let unknown = call("close", vec![field("p", ptr(blob()))], vec![Arg::pointer(0x77, None)]);
        let prog = Prog::new(vec![c(), c(), unknown]);
        let out = normalize_prog(&prog, &book).into_prog();
        let addr = |ci: usize, ai: usize| match &out.calls[ci].args[ai] {
            Arg::Pointer(p) => p.address,
            _ => unreachable!(),
        };
        assert_eq!(addr(0, 0), 0x7f0000010000);
        assert_eq!(addr(0, 1), 0x7f0000010400);
        // each call starts from the shared counters again
        assert_eq!(addr(1, 0), 0x7f0000010000);
        assert_eq!(addr(2, 0), 0x77);
        assert_eq!(book.snapshot().unwrap()["sendto$llc"], 0);
    }

    #[test]
    fn variant_does_not_borrow_base_name_addresses() {
        let book = AddressBook::new();
        book.register("sendto", 0x7f0000010000).unwrap();
        let c = call(
            "sendto$llc",
            vec![field("buf", ptr(blob())), field("addr", ptr(blob()))],
            vec![Arg::pointer(0x1, None), Arg::pointer(0x2, None)],
        );
        let out = normalize_prog(&Prog::new(vec![c]), &book);
        assert!(out.is_success());
        let addrs: Vec<u64> = out.into_prog().calls[0]
            .args
            .iter()
            .map(|a| match a {
                Arg::Pointer(p) => p.address,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(addrs, vec![0x1, 0x2]);
    }

    #[test]
    fn struct_count_mismatch_leaves_group_untouched() {
        let st = Type::Struct {
            fields: vec![field("a", Type::Int), field("b", Type::Int)],
        };
        let group = Arg::strukt(vec![Arg::constant(5)]);
        let c = call("ioctl", vec![field("arg", st)], vec![group.clone()]);
        let out = normalize_prog(&Prog::new(vec![c]), &AddressBook::new());
        assert!(out.is_success());
        assert_eq!(out.into_prog().calls[0].args[0], group);
    }

    #[test]
    fn unions_recurse_into_selected_option_only() {
        let un = Type::Union {
            fields: vec![field("raw", blob()), field("fd", Type::Int)],
        };
        let c = call(
            "setsockopt",
            vec![field("val", un), field("res", Type::Resource { name: "fd".into() })],
            vec![
                Arg::union(1, "fd", Arg::constant(4)),
                Arg::Result(ResultArg::reference(2)),
            ],
        );
        let out = normalize_prog(&Prog::new(vec![c]), &AddressBook::new()).into_prog();
        assert_eq!(out.calls[0].args[0], Arg::union(1, "fd", Arg::constant(INVALID_FD)));
        assert_eq!(out.calls[0].args[1], Arg::Result(ResultArg::reference(2)));
    }

    #[test]
    fn schema_mismatch_returns_original_program() {
        let un = Type::Union {
            fields: vec![field("only", Type::Int)],
        };
        let good = call("getpid", vec![field("x", Type::Int)], vec![Arg::constant(9)]);
        let bad = call("bind", vec![field("u", un)], vec![Arg::union(3, "gone", Arg::constant(1))]);
        let prog = Prog::new(vec![good, bad]);
        let out = normalize_prog(&prog, &AddressBook::new());
        assert_eq!(out, Normalized::Unchanged(prog.clone()));

        let short = call("read", vec![field("fd", Type::Int)], vec![]);
        let prog = Prog::new(vec![short]);
        assert!(!normalize_prog(&prog, &AddressBook::new()).is_success());
    }

    #[test]
    fn input_data_with_non_buffer_type_aborts() {
        let c = call("write", vec![field("x", Type::Int)], vec![Arg::Data(DataArg::input(vec![1]))]);
        let err = normalize_call(&mut c.clone(), &AddressBook::new()).unwrap_err();
        assert!(matches!(err, NormalizeError::TypeMismatch { expected: "buffer", .. }));
    }

    #[test]
    fn blobs_are_canonicalized() {
        let text = "bpf(0x5, &(0x7f0000000000)=@ANYBLOB=\"0011aabb\", 0x90)";
        let out = canonicalize_blobs(text);
        assert_eq!(
            out,
            format!("bpf(0x5, &(0x7f0000000000)={}, 0x90)", canonical_blob())
        );
        // not a blob literal: no closing quote after the alnum run
        let odd = "x(@ANYBLOB=\"zz-\")";
        assert_eq!(canonicalize_blobs(odd), odd);
        assert!(canonical_blob().starts_with("@ANYBLOB=\"02000000bf01"));
    }
}
