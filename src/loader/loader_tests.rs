use super::*;
use crate::codec::CodecKind;
use crate::coord::Position;
use crate::kv::KvBackend;
use crate::node::Connection;
use serde_json::json;

fn temp_store() -> (Arc<NodeStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(KvBackend::open(dir.path()).unwrap());
    (Arc::new(NodeStore::new(backend, CodecKind::Json)), dir)
}

fn node_at(t: f64) -> Node {
    Node::new(Position::new(t, 1.0, 0.0).unwrap(), json!({}))
}

#[test]
fn get_materializes_from_store_and_caches() {
    let (store, _dir) = temp_store();
    let node = node_at(1.0);
    store.put(&node).unwrap();

    let loader = PartialLoader::new(Arc::clone(&store), 16, 60_000);
    let fetched = loader.get(node.id).unwrap().unwrap();
    assert_eq!(fetched.id, node.id);
    assert_eq!(loader.resident_count(), 1);
}

#[test]
fn get_missing_id_returns_none() {
    let (store, _dir) = temp_store();
    let loader = PartialLoader::new(store, 16, 60_000);
    assert!(loader.get(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn gc_evicts_oldest_unpinned_unreferenced_entries() {
    let (store, _dir) = temp_store();
    let mut ids = Vec::new();
    for i in 0..5 {
        let node = node_at(i as f64);
        store.put(&node).unwrap();
        ids.push(node.id);
    }

    let loader = PartialLoader::new(store, 3, 60_000);
    for id in &ids {
        loader.get(*id).unwrap();
    }
    assert_eq!(loader.resident_count(), 5);

    loader.run_gc();
    assert_eq!(loader.resident_count(), 3);
    // The two oldest (first accessed) should be the ones evicted.
    assert!(loader.inner.lock().loaded_nodes.contains_key(&ids[4]));
    assert!(loader.inner.lock().loaded_nodes.contains_key(&ids[3]));
}

#[test]
fn pinned_entries_survive_gc() {
    let (store, _dir) = temp_store();
    let node = node_at(0.0);
    store.put(&node).unwrap();
    let other = node_at(1.0);
    store.put(&other).unwrap();

    let loader = PartialLoader::new(store, 1, 60_000);
    loader.get(node.id).unwrap();
    loader.pin(node.id);
    loader.get(other.id).unwrap();

    loader.run_gc();
    assert!(loader.inner.lock().loaded_nodes.contains_key(&node.id));
}

#[test]
fn referenced_entries_survive_gc() {
    let (store, _dir) = temp_store();
    let node = node_at(0.0);
    store.put(&node).unwrap();
    let other = node_at(1.0);
    store.put(&other).unwrap();

    let loader = PartialLoader::new(store, 1, 60_000);
    loader.get(node.id).unwrap();
    loader.begin_usage(node.id);
    loader.get(other.id).unwrap();

    loader.run_gc();
    assert!(loader.inner.lock().loaded_nodes.contains_key(&node.id));

    loader.end_usage(node.id);
    loader.run_gc();
    assert!(!loader.inner.lock().loaded_nodes.contains_key(&node.id));
}

#[test]
fn load_temporal_window_applies_filter_and_prefetches_connections() {
    let (store, _dir) = temp_store();
    let mut base = node_at(0.0);
    let target = node_at(1.0);
    base.add_connection(Connection::new(target.id, "related", 1.0));
    store.put(&base).unwrap();
    store.put(&target).unwrap();

    let loader = PartialLoader::new(store, 16, 60_000);
    let results = loader.load_temporal_window(&[base.id], 0.0, 2.0, None).unwrap();
    assert_eq!(results.len(), 1);
    // The connected peer should have been prefetched into residency.
    assert!(loader.inner.lock().loaded_nodes.contains_key(&target.id));
}

#[test]
fn load_spatial_region_respects_filter() {
    let (store, _dir) = temp_store();
    let node = node_at(0.0);
    store.put(&node).unwrap();

    let loader = PartialLoader::new(store, 16, 60_000);
    let filter: &dyn Fn(&Node) -> bool = &|_n| false;
    let results = loader.load_spatial_region(&[node.id], (0.0, 0.0, 1.0, 1.0), Some(filter)).unwrap();
    assert!(results.is_empty());
}
