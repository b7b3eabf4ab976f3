use super::*;

#[test]
fn insert_and_range_finds_members() {
    let mut idx = TemporalIndex::new(0.0);
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    idx.insert(1.0, a);
    idx.insert(5.0, b);
    let found = idx.range(0.0, 2.0);
    assert_eq!(found, vec![a]);
}

#[test]
fn remove_drops_empty_buckets() {
    let mut idx = TemporalIndex::new(0.0);
    let a = Uuid::new_v4();
    idx.insert(1.0, a);
    assert!(idx.remove(1.0, a));
    assert!(idx.is_empty());
    assert!(!idx.remove(1.0, a));
}

#[test]
fn resolution_buckets_nearby_timestamps_together() {
    let mut idx = TemporalIndex::new(1.0);
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    idx.insert(1.01, a);
    idx.insert(1.04, b);
    assert_eq!(idx.len(), 2);
    let found = idx.range(0.5, 1.5);
    assert!(found.contains(&a) && found.contains(&b));
}

#[test]
fn estimate_matches_range_cardinality() {
    let mut idx = TemporalIndex::new(0.0);
    for i in 0..5 {
        idx.insert(i as f64, Uuid::new_v4());
    }
    assert_eq!(idx.estimate(0.0, 2.0), 3);
    assert_eq!(idx.range(0.0, 2.0).len(), 3);
}
