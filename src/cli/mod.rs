// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! CLI entry: argument parsing and subcommand dispatch.

pub mod args;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;

use crate::addr::{load_address_table, AddressBook};
use crate::cli::args::{Cli, Command};
use crate::config::EngineConfig;
use crate::mutate::{query_text, splice_text};
use crate::oracle::HttpOracle;

fn read_program(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading program {}", path.display()))
}

fn print_statements(statements: &[String]) {
    for stmt in statements {
        println!("{stmt}");
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<EngineConfig> {
    Ok(match path {
        Some(path) => EngineConfig::load(&path)?.with_env()?,
        None => EngineConfig::from_env()?,
    })
}

/// Parse the process arguments and run the selected subcommand.
pub fn run() -> anyhow::Result<()> {
    dispatch(Cli::parse())
}

pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Splice {
            program,
            position,
            proposal,
        } => {
            let text = read_program(&program)?;
            print_statements(&splice_text(&text, position, &proposal)?);
        }
        Command::Query {
            program,
            position,
            config,
        } => {
            let cfg = load_config(config)?;
            let oracle = HttpOracle::from_config(&cfg);
            info!("using oracle at {}", oracle.url());
            let text = read_program(&program)?;
            print_statements(&query_text(&oracle, &text, position)?);
        }
        Command::Addr {
            table,
            config,
            call,
            count,
        } => {
            let table = match table {
                Some(path) => path,
                None => load_config(config)?.addr_table,
            };
            let book = AddressBook::new();
            load_address_table(&table, &book)?;
            for _ in 0..count {
                match book.allocate(&call)? {
                    Some(addr) => println!("{call} 0x{addr:x}"),
                    None => anyhow::bail!("{call} is not in {}", table.display()),
                }
            }
        }
    }
    Ok(())
}
