// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Structured program model.
//!
//! A [`Prog`] is an ordered list of [`Call`]s. Each call carries its
//! [`Syscall`] schema and an argument tree built from the closed [`Arg`]
//! sum type. The schema side ([`Type`], [`Field`]) drives the normalizer;
//! the argument side is what gets serialized into call statements.

pub mod encoding;

use std::sync::Arc;

/// Identifier of a syscall inside the host's syscall table.
pub type SyscallId = usize;

/// Data-flow direction of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    In,
    Out,
    InOut,
}

/// Flavour of a buffer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Blob,
    Filename,
    String,
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Plain integer scalar.
    Int,
    /// Bit-flags scalar.
    Flags,
    /// Handle produced by one call and consumed by others.
    Resource { name: String },
    Buffer { kind: BufferKind, values: Vec<String> },
    Ptr { elem: Box<Type> },
    Struct { fields: Vec<Field> },
    Union { fields: Vec<Field> },
    Array { elem: Box<Type> },
}

/// Named, typed slot of a call or aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub dir: Dir,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type, dir: Dir) -> Self {
        Self {
            name: name.into(),
            ty,
            dir,
        }
    }
}

/// Syscall schema: name plus declared argument fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Syscall {
    pub id: SyscallId,
    pub name: String,
    pub args: Vec<Field>,
    pub returns_resource: bool,
}

impl Syscall {
    /// Base name of the call, i.e. the part before any `$` variant suffix.
    pub fn call_name(&self) -> &str {
        self.name.split('$').next().unwrap_or(&self.name)
    }
}

/// Scalar argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstArg {
    pub dir: Dir,
    pub val: u64,
}

/// Content of a data argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Literal input bytes.
    Bytes(Vec<u8>),
    /// Output buffer of the given size; contents are produced by the kernel.
    Output(u64),
}

/// Buffer argument.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArg {
    pub dir: Dir,
    pub payload: Payload,
}

impl DataArg {
    pub fn input(data: impl Into<Vec<u8>>) -> Self {
        Self {
            dir: Dir::In,
            payload: Payload::Bytes(data.into()),
        }
    }

    pub fn output(size: u64) -> Self {
        Self {
            dir: Dir::Out,
            payload: Payload::Output(size),
        }
    }
}

/// Pointer argument; `pointee == None` serializes as `nil`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerArg {
    pub dir: Dir,
    pub address: u64,
    pub pointee: Option<Box<Arg>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Struct,
    Array,
}

/// Aggregate argument (struct or array).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupArg {
    pub dir: Dir,
    pub kind: GroupKind,
    pub inner: Vec<Arg>,
}

/// Tagged-union argument with the selected option.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionArg {
    pub dir: Dir,
    pub index: usize,
    pub option_name: String,
    pub option: Box<Arg>,
}

/// Resource argument. Either defines a resource inline (`<rN=>val`),
/// references an earlier one (`rN`), or is a plain value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultArg {
    pub dir: Dir,
    pub defines: Option<u64>,
    pub uses: Option<u64>,
    pub val: u64,
}

impl ResultArg {
    pub fn reference(id: u64) -> Self {
        Self {
            dir: Dir::In,
            defines: None,
            uses: Some(id),
            val: 0,
        }
    }

    pub fn define(id: u64, val: u64) -> Self {
        Self {
            dir: Dir::Out,
            defines: Some(id),
            uses: None,
            val,
        }
    }
}

/// Argument tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Const(ConstArg),
    Data(DataArg),
    Pointer(PointerArg),
    Group(GroupArg),
    Union(UnionArg),
    Result(ResultArg),
}

impl Arg {
    pub fn constant(val: u64) -> Self {
        Arg::Const(ConstArg { dir: Dir::In, val })
    }

    pub fn pointer(address: u64, pointee: Option<Arg>) -> Self {
        Arg::Pointer(PointerArg {
            dir: Dir::In,
            address,
            pointee: pointee.map(Box::new),
        })
    }

    pub fn strukt(inner: Vec<Arg>) -> Self {
        Arg::Group(GroupArg {
            dir: Dir::In,
            kind: GroupKind::Struct,
            inner,
        })
    }

    pub fn array(inner: Vec<Arg>) -> Self {
        Arg::Group(GroupArg {
            dir: Dir::In,
            kind: GroupKind::Array,
            inner,
        })
    }

    pub fn union(index: usize, option_name: impl Into<String>, option: Arg) -> Self {
        Arg::Union(UnionArg {
            dir: Dir::In,
            index,
            option_name: option_name.into(),
            option: Box::new(option),
        })
    }

    pub fn dir(&self) -> Dir {
        match self {
            Arg::Const(a) => a.dir,
            Arg::Data(a) => a.dir,
            Arg::Pointer(a) => a.dir,
            Arg::Group(a) => a.dir,
            Arg::Union(a) => a.dir,
            Arg::Result(a) => a.dir,
        }
    }
}

/// Fault-injection knobs attached to a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallProps {
    pub fail_nth: i32,
    pub rerun: i32,
}

/// One call of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub meta: Arc<Syscall>,
    pub args: Vec<Arg>,
    /// Resource id bound by the `rN = ` prefix, if any.
    pub ret: Option<u64>,
    pub props: CallProps,
}

impl Call {
    pub fn new(meta: Arc<Syscall>, args: Vec<Arg>) -> Self {
        Self {
            meta,
            args,
            ret: None,
            props: CallProps::default(),
        }
    }

    pub fn with_ret(mut self, id: u64) -> Self {
        self.ret = Some(id);
        self
    }
}

/// Structured program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prog {
    pub calls: Vec<Call>,
}

impl Prog {
    pub fn new(calls: Vec<Call>) -> Self {
        Self { calls }
    }
}

/// Errors reported by the host-side program parser.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to deserialize program: {0}")]
    Deserialize(String),
}

/// Host collaborator turning textual programs back into structured ones.
///
/// Implementations are expected to be tolerant of minor inconsistencies
/// (non-strict mode) and must be safe to share between workers.
pub trait ProgramParser: Send + Sync {
    fn deserialize(&self, text: &str) -> Result<Prog, HostError>;
}
