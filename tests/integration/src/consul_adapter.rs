//! ConsulStore against a fake agent speaking the Consul KV HTTP API
//!
//! Covers the request shapes (paths, queries, token header) and the
//! versioning contract the engine relies on.

use kvsync_store::{ConsulStore, KvStore, MemoryStore, ModifyIndex, StoreConfig, StoreError};
use kvsync_test_utils::FakeConsul;
use pretty_assertions::assert_eq;

fn client(agent: &FakeConsul) -> ConsulStore {
    ConsulStore::new(&StoreConfig::new(agent.address())).unwrap()
}

#[test]
fn test_list_of_missing_prefix_is_empty() {
    let agent = FakeConsul::start(MemoryStore::new());

    assert!(client(&agent).list("nothing/").unwrap().is_empty());
}

#[test]
fn test_list_sends_recurse_and_skips_siblings() {
    let agent = FakeConsul::start(MemoryStore::with_entries([
        ("svc/a.ini", "a"),
        ("svc/sub/b.ini", "b"),
        ("svc2/c.ini", "c"),
    ]));

    let keys: Vec<String> = client(&agent)
        .list("svc/")
        .unwrap()
        .into_iter()
        .map(|entry| entry.key)
        .collect();

    assert_eq!(keys, vec!["svc/a.ini", "svc/sub/b.ini"]);
    let request = &agent.requests()[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/v1/kv/svc/");
    assert_eq!(request.query.as_deref(), Some("recurse=true"));
}

#[test]
fn test_list_of_store_root() {
    let agent = FakeConsul::start(MemoryStore::with_entries([("a", "1"), ("b/c", "2")]));

    let entries = client(&agent).list("").unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(agent.requests()[0].path, "/v1/kv/");
}

#[test]
fn test_put_returns_version_seen_by_get() {
    let agent = FakeConsul::start(MemoryStore::new());
    let store = client(&agent);

    let version = store.put("svc/app.ini", b"port = 80\n").unwrap();
    let entry = store.get("svc/app.ini").unwrap().unwrap();

    assert_eq!(entry.value, b"port = 80\n");
    assert_eq!(entry.version, version);
    assert_eq!(agent.store().version_of("svc/app.ini"), Some(version));
}

#[test]
fn test_empty_value_round_trips() {
    let agent = FakeConsul::start(MemoryStore::new());
    let store = client(&agent);

    store.put("svc/empty.ini", b"").unwrap();

    assert_eq!(store.get("svc/empty.ini").unwrap().unwrap().value, Vec::<u8>::new());
}

#[test]
fn test_binary_value_round_trips() {
    let agent = FakeConsul::start(MemoryStore::new());
    let store = client(&agent);
    let payload = vec![0u8, 159, 146, 150, 255, b'\n'];

    store.put("svc/blob", &payload).unwrap();

    assert_eq!(store.get("svc/blob").unwrap().unwrap().value, payload);
}

#[test]
fn test_keys_with_reserved_characters_round_trip() {
    let agent = FakeConsul::start(MemoryStore::new());
    let store = client(&agent);

    for key in ["svc/with space.ini", "svc/q?mark.ini", "svc/hash#tag.ini", "svc/ünïcode.ini"] {
        store.put(key, key.as_bytes()).unwrap();
        let entry = store.get(key).unwrap().unwrap();
        assert_eq!(entry.key, key);
        assert_eq!(entry.value, key.as_bytes());
    }
    assert_eq!(agent.store().snapshot().len(), 4);
}

#[test]
fn test_get_of_missing_key_is_none() {
    let agent = FakeConsul::start(MemoryStore::new());

    assert!(client(&agent).get("svc/absent").unwrap().is_none());
}

#[test]
fn test_compare_and_swap_honours_version() {
    let agent = FakeConsul::start(MemoryStore::with_entries([("svc/app.ini", "v1")]));
    let store = client(&agent);
    let current = store.get("svc/app.ini").unwrap().unwrap().version;

    assert!(!store
        .compare_and_swap("svc/app.ini", b"stale", ModifyIndex(current.0 + 100))
        .unwrap());
    assert!(store.compare_and_swap("svc/app.ini", b"v2", current).unwrap());

    assert_eq!(store.get("svc/app.ini").unwrap().unwrap().value, b"v2");
    let cas = agent
        .requests()
        .into_iter()
        .rev()
        .find(|r| r.method == "PUT")
        .unwrap();
    assert_eq!(cas.query, Some(format!("cas={}", current.0)));
}

#[test]
fn test_compare_and_swap_zero_creates_only_when_absent() {
    let agent = FakeConsul::start(MemoryStore::with_entries([("svc/taken", "x")]));
    let store = client(&agent);

    assert!(store.compare_and_swap("svc/fresh", b"y", ModifyIndex(0)).unwrap());
    assert!(!store.compare_and_swap("svc/taken", b"y", ModifyIndex(0)).unwrap());
    assert_eq!(agent.store().snapshot()["svc/taken"], b"x");
}

#[test]
fn test_compare_and_delete_honours_version() {
    let agent = FakeConsul::start(MemoryStore::with_entries([("svc/old.ini", "x")]));
    let store = client(&agent);
    let current = store.get("svc/old.ini").unwrap().unwrap().version;

    // Another writer moves the key on
    agent.store().put("svc/old.ini", b"y").unwrap();
    assert!(!store.compare_and_delete("svc/old.ini", current).unwrap());

    let fresh = store.get("svc/old.ini").unwrap().unwrap().version;
    assert!(store.compare_and_delete("svc/old.ini", fresh).unwrap());
    assert!(store.get("svc/old.ini").unwrap().is_none());
}

#[test]
fn test_compare_and_delete_of_absent_key_succeeds() {
    let agent = FakeConsul::start(MemoryStore::new());
    let store = client(&agent);

    assert!(store.compare_and_delete("svc/gone.ini", ModifyIndex(42)).unwrap());
    assert!(agent.store().snapshot().is_empty());
}

#[test]
fn test_token_is_sent_when_configured() {
    let agent = FakeConsul::with_token(MemoryStore::with_entries([("svc/a", "a")]), "s3cret");
    let store = ConsulStore::new(&StoreConfig::new(agent.address()).with_token("s3cret")).unwrap();

    assert_eq!(store.list("svc/").unwrap().len(), 1);
    assert_eq!(agent.requests()[0].token.as_deref(), Some("s3cret"));
}

#[test]
fn test_missing_token_surfaces_status_error() {
    let agent = FakeConsul::with_token(MemoryStore::with_entries([("svc/a", "a")]), "s3cret");
    let store = client(&agent);

    let err = store.list("svc/").unwrap_err();

    match err {
        StoreError::Status { op, status, .. } => {
            assert_eq!(op, "list");
            assert_eq!(status, 403);
        }
        other => panic!("expected Status, got {other:?}"),
    }
    assert_eq!(agent.requests()[0].token, None);
}

#[test]
fn test_unreachable_agent_is_a_transport_error() {
    let store = ConsulStore::new(&StoreConfig::new("127.0.0.1:1")).unwrap();

    let err = store.get("svc/a").unwrap_err();

    assert!(matches!(err, StoreError::Transport { op: "get", .. }), "got {err:?}");
}
