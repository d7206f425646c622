// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Deterministic pointer-address allocation keyed by call name.
//!
//! The book holds one base address and one allocation counter per call
//! name. The n-th allocation for a call yields `base + n * ADDR_STEP`.
//! A name without a counter yields no address at all; callers keep the
//! pointer's existing address in that case.
//!
//! The book is shared between workers as `Arc<AddressBook>`. Counter
//! updates are serialized by a single mutex so two workers never receive
//! the same address. Normalization does not touch the shared counters:
//! it allocates from an [`AddrCursor`] built over a snapshot, and the
//! cursor's allocations vanish when it is dropped.

pub mod table;

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use log::debug;
use thiserror::Error;

pub use table::{load_address_table, parse_address_table, UNKNOWN_CALL};

/// Distance between two consecutive addresses handed out for the same call.
pub const ADDR_STEP: u64 = 0x400;

/// Errors returned by [`AddressBook`] operations.
#[derive(Debug, Error)]
pub enum AddrError {
    #[error("address book lock poisoned")]
    LockPoisoned,
    #[error("failed to read address table {path}: {source}")]
    Table {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

type AddrResult<T> = Result<T, AddrError>;

/// Process-wide address book.
#[derive(Debug, Default)]
pub struct AddressBook {
    bases: RwLock<HashMap<String, u64>>,
    counters: Mutex<HashMap<String, u64>>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `base` for `call_name` and reset its counter to zero.
    pub fn register(&self, call_name: &str, base: u64) -> AddrResult<()> {
        self.bases
            .write()
            .map_err(|_| AddrError::LockPoisoned)?
            .insert(call_name.to_owned(), base);
        self.counters
            .lock()
            .map_err(|_| AddrError::LockPoisoned)?
            .insert(call_name.to_owned(), 0);
        Ok(())
    }

    /// Base address recorded for `call_name`.
    pub fn base(&self, call_name: &str) -> AddrResult<Option<u64>> {
        Ok(self
            .bases
            .read()
            .map_err(|_| AddrError::LockPoisoned)?
            .get(call_name)
            .copied())
    }

    /// Hand out the next shared address for `call_name`.
    ///
    /// Returns `Ok(None)` when the call has no counter entry.
    pub fn allocate(&self, call_name: &str) -> AddrResult<Option<u64>> {
        let mut counters = self.counters.lock().map_err(|_| AddrError::LockPoisoned)?;
        let Some(counter) = counters.get_mut(call_name) else {
            return Ok(None);
        };
        let n = *counter;
        *counter += 1;
        drop(counters);
        let base = self.base(call_name)?.unwrap_or_default();
        Ok(Some(base + ADDR_STEP * n))
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> AddrResult<HashMap<String, u64>> {
        Ok(self
            .counters
            .lock()
            .map_err(|_| AddrError::LockPoisoned)?
            .clone())
    }

    /// Private allocator over a snapshot of the counters.
    pub fn cursor(&self) -> AddrResult<AddrCursor<'_>> {
        let counters = self.snapshot()?;
        debug!("address cursor over {} counters", counters.len());
        Ok(AddrCursor {
            book: self,
            counters,
        })
    }

    pub fn len(&self) -> AddrResult<usize> {
        Ok(self.counters.lock().map_err(|_| AddrError::LockPoisoned)?.len())
    }

    pub fn is_empty(&self) -> AddrResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Allocation cursor over a private counter snapshot.
pub struct AddrCursor<'a> {
    book: &'a AddressBook,
    counters: HashMap<String, u64>,
}

impl AddrCursor<'_> {
    /// Same contract as [`AddressBook::allocate`], against the private counters.
    pub fn allocate(&mut self, call_name: &str) -> AddrResult<Option<u64>> {
        let Some(counter) = self.counters.get_mut(call_name) else {
            return Ok(None);
        };
        let n = *counter;
        *counter += 1;
        let base = self.book.base(call_name)?.unwrap_or_default();
        Ok(Some(base + ADDR_STEP * n))
    }
}
