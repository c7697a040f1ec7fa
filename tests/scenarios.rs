//! Wire-level scenario tests
//!
//! Each test drives a session with command lines and asserts the exact
//! response strings a client would read.

use shoal::{Session, Store, SyncMode, Wal};
use std::sync::Arc;
use tempfile::tempdir;

fn open_session(dir: &tempfile::TempDir) -> (Session, Arc<Store>) {
    let wal = Wal::open(dir.path().join("wal.log"), SyncMode::OsBuffered).unwrap();
    let store = Arc::new(Store::open(wal).unwrap());
    (Session::new(Arc::clone(&store)), store)
}

fn send(session: &mut Session, line: &str) -> String {
    session.execute(line.split_whitespace().map(str::to_string).collect())
}

#[test]
fn scenario_string_lifecycle() {
    let dir = tempdir().unwrap();
    let (mut session, store) = open_session(&dir);

    assert_eq!(send(&mut session, "SET foo bar"), "OK");
    assert_eq!(send(&mut session, "GET foo"), "bar");
    assert_eq!(send(&mut session, "DEL foo"), "OK");
    assert_eq!(send(&mut session, "GET foo"), "(nil)");
    store.wal().close().unwrap();
}

#[test]
fn scenario_list_push_pop_render() {
    let dir = tempdir().unwrap();
    let (mut session, store) = open_session(&dir);

    assert_eq!(send(&mut session, "LPUSH L a b c"), "(integer) 3");
    // LPUSH lays the argument block down in supplied order
    assert_eq!(send(&mut session, "LRANGE L 0 -1"), "1) a\n2) b\n3) c");
    assert_eq!(send(&mut session, "RPUSH L x"), "(integer) 4");
    assert_eq!(send(&mut session, "LRANGE L 0 -1"), "1) a\n2) b\n3) c\n4) x");
    store.wal().close().unwrap();
}

#[test]
fn scenario_wrongtype_leaves_value_intact() {
    let dir = tempdir().unwrap();
    let (mut session, store) = open_session(&dir);

    assert_eq!(send(&mut session, "SET s hello"), "OK");
    let response = send(&mut session, "LPUSH s x");
    assert!(response.starts_with("ERR WRONGTYPE"), "{response}");
    assert_eq!(send(&mut session, "GET s"), "hello");
    store.wal().close().unwrap();
}

#[test]
fn scenario_hash_lifecycle() {
    let dir = tempdir().unwrap();
    let (mut session, store) = open_session(&dir);

    assert_eq!(send(&mut session, "HSET h f1 v1 f2 v2"), "(integer) 2");
    assert_eq!(send(&mut session, "HGET h f1"), "v1");
    assert_eq!(send(&mut session, "HDEL h f1 f2"), "(integer) 2");
    // The emptied hash is gone; TYPE answers the legacy NULL
    assert_eq!(send(&mut session, "TYPE h"), "NULL");
    store.wal().close().unwrap();
}

#[test]
fn scenario_transaction_batch() {
    let dir = tempdir().unwrap();
    let (mut session, store) = open_session(&dir);

    assert_eq!(send(&mut session, "MULTI"), "OK");
    assert_eq!(send(&mut session, "SET a 1"), "QUEUED");
    assert_eq!(send(&mut session, "SET b 2"), "QUEUED");
    assert_eq!(send(&mut session, "EXEC"), "OK\nOK");
    assert_eq!(send(&mut session, "GET a"), "1");
    assert_eq!(send(&mut session, "GET b"), "2");
    store.wal().close().unwrap();
}

#[test]
fn scenario_two_sessions_share_one_store() {
    let dir = tempdir().unwrap();
    let (mut first, store) = open_session(&dir);
    let mut second = Session::new(Arc::clone(&store));

    // A transaction on one connection is invisible to the other until EXEC
    send(&mut first, "MULTI");
    send(&mut first, "SET shared yes");
    assert_eq!(send(&mut second, "GET shared"), "(nil)");

    send(&mut first, "EXEC");
    assert_eq!(send(&mut second, "GET shared"), "yes");

    // Queueing state is per connection
    assert_eq!(
        send(&mut second, "EXEC"),
        "ERR: Not in Transaction Mode for EXEC"
    );
    store.wal().close().unwrap();
}
