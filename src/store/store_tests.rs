use super::*;
use crate::coord::Position;
use serde_json::json;

fn open_store() -> (NodeStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(KvBackend::open(dir.path()).unwrap());
    (NodeStore::new(backend, CodecKind::Binary), dir)
}

#[test]
fn put_get_delete_round_trip() {
    let (store, _dir) = open_store();
    let node = Node::new(Position::new(0.0, 1.0, 0.0).unwrap(), json!({"a": 1}));
    store.put(&node).unwrap();
    assert!(store.exists(node.id).unwrap());
    assert_eq!(store.get(node.id).unwrap(), Some(node.clone()));
    assert!(store.delete(node.id).unwrap());
    assert_eq!(store.get(node.id).unwrap(), None);
}

#[test]
fn count_and_list_ids_scan_every_node() {
    let (store, _dir) = open_store();
    let nodes: Vec<Node> = (0..5)
        .map(|i| Node::new(Position::new(i as f64, 1.0, 0.0).unwrap(), json!(i)))
        .collect();
    store.batch_put(&nodes).unwrap();
    assert_eq!(store.count().unwrap(), 5);
    let ids = store.list_ids().unwrap();
    assert_eq!(ids.len(), 5);
    for n in &nodes {
        assert!(ids.contains(&n.id));
    }
}

#[test]
fn batch_get_returns_only_present_ids() {
    let (store, _dir) = open_store();
    let node = Node::new(Position::new(0.0, 1.0, 0.0).unwrap(), json!({}));
    store.put(&node).unwrap();
    let missing = Uuid::new_v4();
    let result = store.batch_get(&[node.id, missing]).unwrap();
    assert_eq!(result.len(), 1);
    assert!(result.contains_key(&node.id));
}
