//! End-to-end scenarios: engine, HTTP adapter and fake agent together
//!
//! Each test drives `Fetcher` and `Syncer` through a real `ConsulStore`
//! so path mapping, escaping and versioning are exercised over the wire.

use std::collections::BTreeMap;
use std::sync::Arc;

use kvsync_core::{EventKind, Fetcher, Mapping, RecordingObserver, SyncOptions, Syncer};
use kvsync_store::{ConsulStore, MemoryStore, StoreConfig};
use kvsync_test_utils::{FakeConsul, LocalTree};
use pretty_assertions::assert_eq;

fn config(agent: &FakeConsul) -> StoreConfig {
    StoreConfig::new(agent.address())
}

fn sync(agent: &FakeConsul, local: &LocalTree, prefix: &str) -> kvsync_core::SyncReport {
    Syncer::connect(&config(agent), Mapping::new(local.path(), prefix), SyncOptions::default())
        .unwrap()
        .sync()
        .unwrap()
}

fn fetch(agent: &FakeConsul, local: &LocalTree, prefix: &str) -> kvsync_core::FetchReport {
    Fetcher::connect(&config(agent), Mapping::new(local.path(), prefix))
        .unwrap()
        .fetch()
        .unwrap()
}

fn entries(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
        .collect()
}

#[test]
fn test_push_then_delete_locally() {
    let agent = FakeConsul::start(MemoryStore::new());
    let local = LocalTree::with_files(&[("config1.ini", "v1"), ("subdir/config2.ini", "v2")]);

    sync(&agent, &local, "svc");
    assert_eq!(
        agent.store().snapshot(),
        entries(&[("svc/config1.ini", "v1"), ("svc/subdir/config2.ini", "v2")])
    );

    local.remove("subdir/config2.ini");
    let report = sync(&agent, &local, "svc");

    assert_eq!(report.deleted, vec!["svc/subdir/config2.ini"]);
    assert_eq!(agent.store().snapshot(), entries(&[("svc/config1.ini", "v1")]));
}

#[test]
fn test_two_operators_share_a_prefix() {
    let agent = FakeConsul::start(MemoryStore::new());
    let alice = LocalTree::with_files(&[("app.ini", "port = 80\n"), ("db/pool.ini", "size = 4\n")]);
    let bob = LocalTree::new();

    sync(&agent, &alice, "services/web");
    fetch(&agent, &bob, "services/web");
    assert_eq!(bob.snapshot(), alice.snapshot());

    bob.write("app.ini", "port = 8080\n");
    bob.remove("db/pool.ini");
    bob.write("cache.ini", "ttl = 60\n");
    let report = sync(&agent, &bob, "services/web");
    assert_eq!(report.created, vec!["services/web/cache.ini"]);
    assert_eq!(report.updated, vec!["services/web/app.ini"]);
    assert_eq!(report.deleted, vec!["services/web/db/pool.ini"]);

    fetch(&agent, &alice, "services/web");
    assert_eq!(alice.read("app.ini"), b"port = 8080\n");
    assert_eq!(alice.read("cache.ini"), b"ttl = 60\n");
    // Fetch never deletes local files
    assert_eq!(alice.read("db/pool.ini"), b"size = 4\n");
}

#[test]
fn test_second_sync_issues_no_writes() {
    let agent = FakeConsul::start(MemoryStore::new());
    let local = LocalTree::with_files(&[("a.ini", "a"), ("b/c.ini", "c")]);

    sync(&agent, &local, "svc");
    let before = agent.requests().len();
    let report = sync(&agent, &local, "svc");

    assert!(report.is_noop());
    let writes = agent.requests()[before..]
        .iter()
        .filter(|r| r.method != "GET")
        .count();
    assert_eq!(writes, 0);
}

#[test]
fn test_sync_to_store_root_over_http() {
    let agent = FakeConsul::start(MemoryStore::with_entries([("stale.ini", "old")]));
    let local = LocalTree::with_files(&[("fresh.ini", "new"), ("nested/deep.ini", "deep")]);

    let report = sync(&agent, &local, "");

    assert_eq!(report.deleted, vec!["stale.ini"]);
    assert_eq!(
        agent.store().snapshot(),
        entries(&[("fresh.ini", "new"), ("nested/deep.ini", "deep")])
    );
}

#[test]
fn test_file_names_needing_escaping() {
    let agent = FakeConsul::start(MemoryStore::new());
    let local = LocalTree::with_files(&[("with space.ini", "1"), ("percent%20.ini", "2")]);

    sync(&agent, &local, "svc");
    assert_eq!(
        agent.store().snapshot(),
        entries(&[("svc/percent%20.ini", "2"), ("svc/with space.ini", "1")])
    );

    let copy = LocalTree::new();
    fetch(&agent, &copy, "svc");
    assert_eq!(copy.snapshot(), local.snapshot());
}

#[test]
fn test_sibling_prefix_survives_sync() {
    let agent = FakeConsul::start(MemoryStore::with_entries([
        ("svc/old.ini", "old"),
        ("svc2/keep.ini", "keep"),
    ]));
    let local = LocalTree::with_files(&[("new.ini", "new")]);

    sync(&agent, &local, "svc");

    assert_eq!(
        agent.store().snapshot(),
        entries(&[("svc/new.ini", "new"), ("svc2/keep.ini", "keep")])
    );
}

#[test]
fn test_dry_run_over_http_only_reads() {
    let agent = FakeConsul::start(MemoryStore::with_entries([("svc/orphan.ini", "x")]));
    let local = LocalTree::with_files(&[("new.ini", "new")]);
    let options = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };

    let report = Syncer::connect(&config(&agent), Mapping::new(local.path(), "svc"), options)
        .unwrap()
        .sync()
        .unwrap();

    assert_eq!(report.created, vec!["svc/new.ini"]);
    assert_eq!(report.deleted, vec!["svc/orphan.ini"]);
    assert!(agent.requests().iter().all(|r| r.method == "GET"));
    assert_eq!(agent.store().snapshot(), entries(&[("svc/orphan.ini", "x")]));
}

#[test]
fn test_token_protected_agent() {
    let agent = FakeConsul::with_token(MemoryStore::new(), "ops-token");
    let local = LocalTree::with_files(&[("a.ini", "a")]);
    let mapping = Mapping::new(local.path(), "svc");

    let denied = Syncer::connect(&config(&agent), mapping.clone(), SyncOptions::default())
        .unwrap()
        .sync();
    assert!(denied.is_err());
    assert!(agent.store().snapshot().is_empty());

    let recorder = Arc::new(RecordingObserver::new());
    Syncer::connect(
        &config(&agent).with_token("ops-token"),
        mapping,
        SyncOptions::default(),
    )
    .unwrap()
    .with_observer(recorder.clone())
    .sync()
    .unwrap();

    assert_eq!(recorder.keys(EventKind::Created), vec!["svc/a.ini"]);
    assert_eq!(agent.store().snapshot(), entries(&[("svc/a.ini", "a")]));
}

#[test]
fn test_fetch_skips_directory_markers_over_http() {
    let agent = FakeConsul::start(MemoryStore::with_entries([
        ("svc/", ""),
        ("svc/conf.d/", ""),
        ("svc/conf.d/app.ini", "app"),
    ]));
    let local = LocalTree::new();

    let report = fetch(&agent, &local, "svc");

    assert_eq!(report.fetched.len(), 1);
    assert_eq!(local.snapshot(), entries(&[("conf.d/app.ini", "app")]));
}

#[test]
fn test_adapter_can_be_built_directly() {
    let agent = FakeConsul::start(MemoryStore::with_entries([("svc/a.ini", "a")]));
    let local = LocalTree::new();
    let store = ConsulStore::new(&config(&agent)).unwrap();

    let report = Fetcher::new(store, Mapping::new(local.path(), "/svc/"))
        .fetch()
        .unwrap();

    assert_eq!(report.fetched[0].key, "svc/a.ini");
    assert_eq!(local.read("a.ini"), b"a");
}
