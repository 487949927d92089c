//! End-to-end tests for the `crdtdot` binary against an on-disk datastore.

use assert_cmd::Command;
use crdtdot_dag::BlockBuilder;
use crdtdot_store::{Cid, Codec, FsBlockStore, Namespace};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

struct Seeded {
    dir: TempDir,
    root: Cid,
    head: Cid,
}

/// Build `<dir>/datastore` holding a two-block history under `namespace`,
/// with `head` recorded as the current head.
fn seed(namespace: &str) -> Seeded {
    let dir = TempDir::new().unwrap();
    let store = FsBlockStore::new(dir.path().join("datastore"));
    let ns = Namespace::new(namespace);

    let root = BlockBuilder::new()
        .with_priority(1)
        .with_element("greeting", serde_json::json!("hello"))
        .build()
        .unwrap();
    let head = BlockBuilder::new()
        .with_parent(root.cid)
        .with_priority(2)
        .with_tombstone("greeting")
        .build()
        .unwrap();

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        store.put(&ns.block_key(&root.cid), &root.bytes).await.unwrap();
        store.put(&ns.block_key(&head.cid), &head.bytes).await.unwrap();
        store
            .put(&ns.head_key(&head.cid), &2u64.to_be_bytes())
            .await
            .unwrap();
    });

    Seeded {
        dir,
        root: root.cid,
        head: head.cid,
    }
}

fn crdtdot(folder: &Path) -> Command {
    let mut cmd = Command::cargo_bin("crdtdot").unwrap();
    cmd.env_remove("CRDTDOT_LOG").arg("-c").arg(folder);
    cmd
}

#[test]
fn test_exports_recorded_heads() {
    let seeded = seed("/crdt");

    crdtdot(seeded.dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph \"crdt\" {"))
        .stdout(predicate::str::contains(format!(
            "\"{}\" [label=\"{}\\n2 | +0 -1\", kind=head",
            seeded.head,
            seeded.head.short()
        )))
        .stdout(predicate::str::contains(format!(
            "\"{}\" [label=\"{}\\n1 | +1 -0\", kind=interior];",
            seeded.root,
            seeded.root.short()
        )))
        .stdout(predicate::str::contains(format!(
            "\"{}\" -> \"{}\";",
            seeded.head, seeded.root
        )));
}

#[test]
fn test_namespace_from_service_config() {
    let seeded = seed("/cluster/crdt");
    std::fs::write(
        seeded.dir.path().join("service.json"),
        r#"{"crdt": {"datastore_namespace": "/cluster/crdt"}}"#,
    )
    .unwrap();

    crdtdot(seeded.dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("kind=head"));
}

#[test]
fn test_explicit_head_with_missing_parent() {
    let seeded = seed("/crdt");
    let unknown = Cid::of(Codec::DagJson, b"not in the store");

    crdtdot(seeded.dir.path())
        .arg("--head")
        .arg(seeded.root.to_string())
        .arg("--head")
        .arg(unknown.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "\"{}\" [label=\"{}\\nmissing\"",
            unknown,
            unknown.short()
        )))
        .stdout(predicate::str::contains(seeded.head.to_string()).not());
}

#[test]
fn test_output_file() {
    let seeded = seed("/crdt");
    let out = seeded.dir.path().join("history.dot");

    crdtdot(seeded.dir.path())
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("digraph"));
    assert!(text.trim_end().ends_with('}'));
}

#[test]
fn test_missing_datastore_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("history.dot");

    crdtdot(dir.path())
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("opening datastore"));

    assert!(!out.exists());
}

#[test]
fn test_unreadable_heads_fail() {
    let seeded = seed("/crdt");
    let unknown = Cid::of(Codec::DagJson, b"nowhere");
    let out = seeded.dir.path().join("history.dot");

    crdtdot(seeded.dir.path())
        .arg("--head")
        .arg(unknown.to_string())
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("generating graph"));

    assert!(!out.exists());
}

#[test]
fn test_malformed_config_fails() {
    let seeded = seed("/crdt");
    std::fs::write(seeded.dir.path().join("service.json"), "{").unwrap();

    crdtdot(seeded.dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading configuration"));
}

#[test]
fn test_empty_namespace_exports_empty_graph() {
    let seeded = seed("/crdt");

    crdtdot(seeded.dir.path())
        .arg("--namespace")
        .arg("/other")
        .assert()
        .success()
        .stdout("digraph \"crdt\" {\n  rankdir=TB;\n  node [shape=box, fontname=\"monospace\"];\n}\n");
}

#[test]
fn test_verbose_logs_export_settings() {
    let seeded = seed("/crdt");

    crdtdot(seeded.dir.path())
        .env("CRDTDOT_LOG_FORMAT", "json")
        .arg("-v")
        .arg("--concurrency")
        .arg("3")
        .assert()
        .success()
        .stderr(predicate::str::contains("starting export"))
        .stderr(predicate::str::contains("\"concurrency\":3"))
        .stderr(predicate::str::contains("\"namespace\":\"/crdt\""));
}
