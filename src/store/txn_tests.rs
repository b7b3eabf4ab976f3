use super::super::NodeStore;
use crate::codec::CodecKind;
use crate::coord::Position;
use crate::kv::KvBackend;
use crate::node::Node;
use serde_json::json;
use std::sync::Arc;

fn open_store() -> (NodeStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(KvBackend::open(dir.path()).unwrap());
    (NodeStore::new(backend, CodecKind::Binary), dir)
}

#[test]
fn commit_applies_staged_writes() {
    let (store, _dir) = open_store();
    let node = Node::new(Position::new(0.0, 1.0, 0.0).unwrap(), json!({"a": 1}));
    let mut tx = store.begin_transaction();
    tx.put(&node).unwrap();
    tx.commit().unwrap();
    assert_eq!(store.get(node.id).unwrap(), Some(node));
}

#[test]
fn second_commit_is_rejected_as_closed() {
    let (store, _dir) = open_store();
    let node = Node::new(Position::new(0.0, 1.0, 0.0).unwrap(), json!({}));
    let mut tx = store.begin_transaction();
    tx.put(&node).unwrap();
    tx.commit().unwrap();
    assert!(tx.commit().is_err());
}

#[test]
fn rollback_after_commit_fails() {
    let (store, _dir) = open_store();
    let node = Node::new(Position::new(0.0, 1.0, 0.0).unwrap(), json!({}));
    let mut tx = store.begin_transaction();
    tx.put(&node).unwrap();
    tx.commit().unwrap();
    assert!(tx.rollback().is_err());
}

#[test]
fn rollback_discards_staged_writes() {
    let (store, _dir) = open_store();
    let node = Node::new(Position::new(0.0, 1.0, 0.0).unwrap(), json!({}));
    let mut tx = store.begin_transaction();
    tx.put(&node).unwrap();
    tx.rollback().unwrap();
    assert_eq!(store.get(node.id).unwrap(), None);
}

#[test]
fn concurrent_writers_one_commit_one_conflict() {
    let (store, _dir) = open_store();
    let mut base = Node::new(Position::new(0.0, 1.0, 0.0).unwrap(), json!({"v": 0}));
    store.put(&base).unwrap();

    let mut tx1 = store.begin_transaction();
    let mut tx2 = store.begin_transaction();

    let _ = tx1.get(base.id).unwrap();
    let _ = tx2.get(base.id).unwrap();

    base.content = json!({"v": 1});
    tx1.put(&base).unwrap();
    assert!(tx1.commit().is_ok());

    let mut other = base.clone();
    other.content = json!({"v": 2});
    tx2.put(&other).unwrap();
    assert!(tx2.commit().is_err());

    let stored = store.get(base.id).unwrap().unwrap();
    assert_eq!(stored.content, json!({"v": 1}));
}
