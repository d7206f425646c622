// CLASSIFICATION: COMMUNITY
// Filename: test_oracle_http.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

use std::io::Read;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serial_test::serial;
use tiny_http::{Response, Server};

use callsplice::addr::AddressBook;
use callsplice::choice::RunTable;
use callsplice::oracle::{HttpOracle, Oracle, OracleError};
use callsplice::prog::encoding::statement_list;
use callsplice::prog::{Arg, Call, Dir, Field, HostError, Prog, ProgramParser, Syscall, Type};
use callsplice::splice::scan::call_name;
use callsplice::Mutator;

/// Serve `replies` in order, recording each request body.
fn fake_oracle(replies: Vec<(u16, &'static str)>) -> Option<(String, Arc<Mutex<Vec<String>>>)> {
    if TcpListener::bind("127.0.0.1:0").is_err() {
        eprintln!("skipping test: cannot bind local port");
        return None;
    }
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&bodies);
    thread::spawn(move || {
        for (status, reply) in replies {
            let Ok(mut req) = server.recv() else { return };
            let mut body = String::new();
            let _ = req.as_reader().read_to_string(&mut body);
            seen.lock().unwrap().push(body);
            let _ = req.respond(Response::from_string(reply).with_status_code(status));
        }
    });
    Some((format!("http://127.0.0.1:{port}/"), bodies))
}

struct ByName(Vec<Arc<Syscall>>);

impl ProgramParser for ByName {
    fn deserialize(&self, text: &str) -> Result<Prog, HostError> {
        statement_list(text)
            .iter()
            .map(|line| {
                let name = call_name(line).ok_or_else(|| HostError::Deserialize(line.clone()))?;
                self.0
                    .iter()
                    .find(|s| s.name == name)
                    .map(|meta| Call::new(Arc::clone(meta), vec![]))
                    .ok_or_else(|| HostError::Deserialize(format!("unknown call {name}")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Prog::new)
    }
}

fn syscalls() -> Vec<Arc<Syscall>> {
    ["socket", "sendto$llc", "close"]
        .iter()
        .enumerate()
        .map(|(id, name)| {
            Arc::new(Syscall {
                id,
                name: name.to_string(),
                args: vec![Field::new("domain", Type::Int, Dir::In)],
                returns_resource: id == 0,
            })
        })
        .collect()
}

fn program() -> Prog {
    let sc = syscalls();
    Prog::new(vec![
        Call::new(Arc::clone(&sc[0]), vec![Arg::constant(0x1a)]).with_ret(0),
        Call::new(Arc::clone(&sc[2]), vec![Arg::constant(0x7)]),
    ])
}

fn mutator(url: &str) -> Mutator {
    Mutator::new(
        Arc::new(AddressBook::new()),
        Arc::new(HttpOracle::new(url, Duration::from_secs(2))),
        Arc::new(ByName(syscalls())),
    )
}

#[test]
#[serial]
fn proposal_is_spliced_and_request_is_normalized() {
    let _ = env_logger::builder().is_test(true).try_init();
    let Some((url, bodies)) =
        fake_oracle(vec![(200, r#"{"State":0,"Syscall":"sendto$llc(@RSTART@socket(0x1a)@REND@, 0x0)"}"#)])
    else {
        return;
    };
    let calls = mutator(&url)
        .mutate_with_oracle(&program(), 1, &mut RunTable::with_enabled(3, [0, 2]))
        .unwrap();
    let names: Vec<_> = calls.iter().map(|c| c.meta.name.as_str()).collect();
    assert_eq!(names, ["socket", "sendto$llc", "close"]);
    let sent = bodies.lock().unwrap();
    assert_eq!(
        sent[0],
        r#"{"Syscalls":["r0 = socket(0x111)","[MASK]","close(0x111)"]}"#
    );
}

#[test]
#[serial]
fn soft_failures_return_original_calls() {
    let _ = env_logger::builder().is_test(true).try_init();
    let Some((url, _)) = fake_oracle(vec![
        (200, r#"{"State":3,"Syscall":"close(0x1)"}"#),
        (200, "not json"),
        (500, "boom"),
        (200, "{}"),
    ]) else {
        return;
    };
    let m = mutator(&url);
    let original = program();
    let mut table = RunTable::new(3);
    for _ in 0..4 {
        let calls = m.mutate_with_oracle(&original, 1, &mut table).unwrap();
        assert_eq!(calls, original.calls);
    }
    assert!(!table.is_insert_only(1));
}

#[test]
#[serial]
fn oracle_errors_are_classified() {
    let Some((url, _)) = fake_oracle(vec![(503, "busy"), (200, "[1, 2")]) else {
        return;
    };
    let oracle = HttpOracle::new(&url, Duration::from_secs(2));
    let masked = vec!["[MASK]".to_string()];
    assert!(matches!(oracle.propose(&masked), Err(OracleError::Status(503))));
    assert!(matches!(oracle.propose(&masked), Err(OracleError::Json(_))));
}
