// CLASSIFICATION: COMMUNITY
// Filename: test_address_table.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

use std::io::Write;
use std::sync::Arc;
use std::thread;

use callsplice::addr::{load_address_table, AddressBook, ADDR_STEP, UNKNOWN_CALL};
use callsplice::normalize::{normalize_prog, Normalized};
use callsplice::prog::{Arg, Call, Dir, Field, Prog, Syscall, Type};

fn table() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "mmap 139637976727552").unwrap();
    writeln!(file, "read 139637976793088").unwrap();
    writeln!(file, "bogus line here").unwrap();
    file
}

fn read_prog() -> Prog {
    let read = Arc::new(Syscall {
        id: 0,
        name: "read".into(),
        args: vec![Field::new(
            "buf",
            Type::Ptr {
                elem: Box::new(Type::Int),
            },
            Dir::In,
        )],
        returns_resource: false,
    });
    Prog::new(vec![
        Call::new(Arc::clone(&read), vec![Arg::pointer(0x20, Some(Arg::constant(5)))]),
        Call::new(read, vec![Arg::pointer(0x40, None)]),
    ])
}

#[test]
fn table_drives_normalized_addresses() {
    let _ = env_logger::builder().is_test(true).try_init();
    let file = table();
    let book = AddressBook::new();
    assert_eq!(load_address_table(file.path(), &book).unwrap(), 2);
    assert_eq!(book.base(UNKNOWN_CALL).unwrap(), Some(139637976793088 + 0x80));

    let Normalized::Success(p) = normalize_prog(&read_prog(), &book) else {
        panic!("normalization failed");
    };
    let addrs: Vec<u64> = p
        .calls
        .iter()
        .map(|c| match &c.args[0] {
            Arg::Pointer(ptr) => ptr.address,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    // each call takes its own cursor
    assert_eq!(addrs, vec![139637976793088, 139637976793088]);
    assert_eq!(book.snapshot().unwrap()["read"], 0);
}

#[test]
fn shared_book_hands_out_unique_addresses() {
    let file = table();
    let book = Arc::new(AddressBook::new());
    load_address_table(file.path(), &book).unwrap();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let book = Arc::clone(&book);
            thread::spawn(move || {
                (0..25)
                    .map(|_| book.allocate("mmap").unwrap().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let mut all: Vec<u64> = workers.into_iter().flat_map(|w| w.join().unwrap()).collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 100);
    assert_eq!(all[99], 139637976727552 + 99 * ADDR_STEP);
}
