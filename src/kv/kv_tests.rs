use super::*;

fn open_test_backend() -> (KvBackend, tempfile::TempDir) {
    crate::init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let backend = KvBackend::open(dir.path()).unwrap();
    (backend, dir)
}

#[test]
fn put_get_delete_round_trip() {
    let (backend, _dir) = open_test_backend();
    backend.put(CF_NODES, b"k1", b"v1").unwrap();
    assert_eq!(backend.get(CF_NODES, b"k1").unwrap(), Some(b"v1".to_vec()));
    assert!(backend.delete(CF_NODES, b"k1").unwrap());
    assert_eq!(backend.get(CF_NODES, b"k1").unwrap(), None);
    assert!(!backend.delete(CF_NODES, b"k1").unwrap());
}

#[test]
fn prefix_scan_only_returns_matching_keys() {
    let (backend, _dir) = open_test_backend();
    backend.put(CF_META, b"a:1", b"x").unwrap();
    backend.put(CF_META, b"a:2", b"y").unwrap();
    backend.put(CF_META, b"b:1", b"z").unwrap();
    let results = backend.prefix_scan(CF_META, b"a:").unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn write_batch_is_atomic_on_success() {
    let (backend, _dir) = open_test_backend();
    let ops = vec![
        BatchOp::Put { cf: CF_NODES, key: b"n1".to_vec(), value: b"v1".to_vec() },
        BatchOp::Put { cf: CF_NODES, key: b"n2".to_vec(), value: b"v2".to_vec() },
    ];
    backend.write_batch(ops).unwrap();
    assert_eq!(backend.get(CF_NODES, b"n1").unwrap(), Some(b"v1".to_vec()));
    assert_eq!(backend.get(CF_NODES, b"n2").unwrap(), Some(b"v2".to_vec()));
}

#[test]
fn range_scan_respects_bounds() {
    let (backend, _dir) = open_test_backend();
    backend.put(CF_TEMPORAL, &keys::temporal_key(1.0, uuid::Uuid::nil()), b"").unwrap();
    backend.put(CF_TEMPORAL, &keys::temporal_key(5.0, uuid::Uuid::nil()), b"").unwrap();
    backend.put(CF_TEMPORAL, &keys::temporal_key(10.0, uuid::Uuid::nil()), b"").unwrap();
    let (lo, hi) = keys::temporal_range_bounds(0.0, 6.0);
    let results = backend.range_scan(CF_TEMPORAL, &lo, &hi).unwrap();
    assert_eq!(results.len(), 2);
}
