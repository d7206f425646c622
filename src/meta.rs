// CLASSIFICATION: COMMUNITY
// Filename: meta.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Call-metadata cache.
//!
//! Maps call names to syscall schemas. Populated once at startup and read
//! by every worker afterwards; reads and writes both go through the same
//! lock so a late registration never races a lookup.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::info;
use thiserror::Error;

use crate::prog::Syscall;

/// Errors returned by [`CallMetaCache`] operations.
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("call metadata lock poisoned")]
    LockPoisoned,
}

type MetaResult<T> = Result<T, MetaError>;

#[derive(Debug, Default)]
pub struct CallMetaCache {
    entries: RwLock<HashMap<String, Arc<Syscall>>>,
}

impl CallMetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from a syscall table.
    pub fn populate<I>(syscalls: I) -> MetaResult<Self>
    where
        I: IntoIterator<Item = Arc<Syscall>>,
    {
        let cache = Self::new();
        let mut count = 0usize;
        for sc in syscalls {
            cache.set(&sc.name.clone(), sc)?;
            count += 1;
        }
        info!("call metadata cache populated with {count} syscalls");
        Ok(cache)
    }

    pub fn set(&self, name: &str, meta: Arc<Syscall>) -> MetaResult<()> {
        self.entries
            .write()
            .map_err(|_| MetaError::LockPoisoned)?
            .insert(name.to_owned(), meta);
        Ok(())
    }

    pub fn get(&self, name: &str) -> MetaResult<Option<Arc<Syscall>>> {
        Ok(self
            .entries
            .read()
            .map_err(|_| MetaError::LockPoisoned)?
            .get(name)
            .cloned())
    }

    pub fn len(&self) -> MetaResult<usize> {
        Ok(self.entries.read().map_err(|_| MetaError::LockPoisoned)?.len())
    }

    pub fn is_empty(&self) -> MetaResult<bool> {
        Ok(self.len()? == 0)
    }
}
