// CLASSIFICATION: COMMUNITY
// Filename: choice.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Choice-table gate applied to spliced programs.
//!
//! A spliced program may call syscalls the fuzzer never enabled. Those are
//! enabled here for insertion only, so the fuzzer can keep mutating the
//! program without ever generating them on its own.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::prog::{Prog, SyscallId};

/// Fuzzer-side table deciding which syscalls may be chosen.
pub trait ChoiceTable {
    fn enabled(&self, id: SyscallId) -> bool;
    /// Enable `id` with a uniform run histogram and exclude it from generation.
    fn enable_insert_only(&mut self, id: SyscallId);
    fn syscall_count(&self) -> usize;
}

/// Run-histogram choice table.
#[derive(Debug, Clone, Default)]
pub struct RunTable {
    runs: HashMap<SyscallId, Vec<u32>>,
    no_generate: HashSet<SyscallId>,
    count: usize,
}

impl RunTable {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    /// Table with `enabled` already active, each with a uniform histogram.
    pub fn with_enabled<I>(count: usize, enabled: I) -> Self
    where
        I: IntoIterator<Item = SyscallId>,
    {
        let mut table = Self::new(count);
        for id in enabled {
            table.runs.insert(id, table.uniform_runs());
        }
        table
    }

    pub fn runs(&self, id: SyscallId) -> Option<&[u32]> {
        self.runs.get(&id).map(Vec::as_slice)
    }

    pub fn is_insert_only(&self, id: SyscallId) -> bool {
        self.no_generate.contains(&id)
    }

    fn uniform_runs(&self) -> Vec<u32> {
        vec![1; self.count.max(1)]
    }
}

impl ChoiceTable for RunTable {
    fn enabled(&self, id: SyscallId) -> bool {
        self.runs.contains_key(&id)
    }

    fn enable_insert_only(&mut self, id: SyscallId) {
        let runs = self.uniform_runs();
        self.runs.insert(id, runs);
        self.no_generate.insert(id);
    }

    fn syscall_count(&self) -> usize {
        self.count
    }
}

/// Enable every syscall `prog` uses and resolve conflicting fault knobs.
///
/// A call may not both rerun and inject a fault: even-indexed calls keep
/// `fail_nth`, odd-indexed calls keep `rerun`.
pub fn enable_calls<T>(prog: &mut Prog, table: &mut T)
where
    T: ChoiceTable + ?Sized,
{
    for (idx, call) in prog.calls.iter_mut().enumerate() {
        let id = call.meta.id;
        if !table.enabled(id) {
            debug!("enabling {} (id {id}) for insertion only", call.meta.name);
            table.enable_insert_only(id);
        }
        let props = &mut call.props;
        if props.rerun > 0 && props.fail_nth > 0 {
            if idx % 2 == 0 {
                props.rerun = 0;
            } else {
                props.fail_nth = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prog::{Call, CallProps, Syscall};
    use std::sync::Arc;

    fn call(id: SyscallId, props: CallProps) -> Call {
        let meta = Arc::new(Syscall {
            id,
            name: format!("sc{id}"),
            args: vec![],
            returns_resource: false,
        });
        let mut c = Call::new(meta, vec![]);
        c.props = props;
        c
    }

    #[test]
    fn disabled_calls_become_insert_only() {
        let mut table = RunTable::with_enabled(4, [0]);
        let mut prog = Prog::new(vec![
            call(0, CallProps::default()),
            call(2, CallProps::default()),
        ]);
        enable_calls(&mut prog, &mut table);
        assert!(table.enabled(2));
        assert!(table.is_insert_only(2));
        assert!(!table.is_insert_only(0));
        assert_eq!(table.runs(2), Some(&[1, 1, 1, 1][..]));
        assert!(!table.enabled(3));
    }

    #[test]
    fn empty_table_still_gets_one_run() {
        let mut table = RunTable::new(0);
        let mut prog = Prog::new(vec![call(7, CallProps::default())]);
        enable_calls(&mut prog, &mut table);
        assert_eq!(table.runs(7), Some(&[1][..]));
        assert_eq!(table.syscall_count(), 0);
    }

    #[test]
    fn fault_knobs_resolved_by_parity() {
        let both = CallProps {
            fail_nth: 3,
            rerun: 2,
        };
        let rerun_only = CallProps {
            fail_nth: 0,
            rerun: 5,
        };
        let mut table = RunTable::new(8);
        let mut prog = Prog::new(vec![call(0, both), call(1, both), call(2, rerun_only)]);
        enable_calls(&mut prog, &mut table);
        assert_eq!(prog.calls[0].props, CallProps { fail_nth: 3, rerun: 0 });
        assert_eq!(prog.calls[1].props, CallProps { fail_nth: 0, rerun: 2 });
        assert_eq!(prog.calls[2].props, rerun_only);
    }
}
