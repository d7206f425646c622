// CLASSIFICATION: COMMUNITY
// Filename: args.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line arguments for the callsplice tool.
#[derive(Debug, Parser)]
#[command(name = "callsplice", version, about = "Resource-aware call splicing for syscall programs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Splice a proposed call into a textual program.
    Splice {
        /// Program file, one statement per line.
        #[arg(long, value_name = "FILE")]
        program: PathBuf,
        /// Statement index the proposal replaces.
        #[arg(long)]
        position: usize,
        /// Proposed call, optionally carrying resource tags.
        #[arg(long)]
        proposal: String,
    },
    /// Ask the oracle for a call at a position and splice its answer.
    Query {
        #[arg(long, value_name = "FILE")]
        program: PathBuf,
        #[arg(long)]
        position: usize,
        /// TOML engine configuration; defaults and environment otherwise.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print addresses handed out for a call from an address table.
    Addr {
        /// Address table; the configured table otherwise.
        #[arg(long, value_name = "FILE")]
        table: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long)]
        call: String,
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}
