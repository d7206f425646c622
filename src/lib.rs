// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Resource-aware call splicing for syscall programs.
//!
//! An external oracle proposes one call for a masked slot in a program.
//! This crate builds the masked query, splices the textual answer back in
//! while keeping every resource reference consistent, and gates the
//! result against the fuzzer's choice table.

/// Deterministic pointer-address allocation
pub mod addr;

/// Choice-table gate
pub mod choice;

/// CLI interface
pub mod cli;

pub mod config;
pub mod error;

/// Masked oracle queries
pub mod mask;

/// Call-metadata cache
pub mod meta;

/// Mutation orchestration
pub mod mutate;

/// Type-directed argument normalization
pub mod normalize;

/// Call-proposal service client
pub mod oracle;

/// Structured programs and their textual form
pub mod prog;

/// Resource resolution and splicing
pub mod splice;

pub use error::EngineError;
pub use mutate::Mutator;
