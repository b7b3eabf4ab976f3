use super::*;
use crate::coord::Rectangle;
use crate::spatial::tree::Pointer;
use uuid::Uuid;

fn leaf_entry(t: f64) -> Entry {
    Entry {
        mbr: Rectangle::new(t, t, 0.0, 1.0, 0.0, 0.1),
        pointer: Pointer::Leaf(Uuid::new_v4()),
    }
}

#[test]
fn split_respects_min_entries_floor() {
    let entries: Vec<Entry> = (0..6).map(|i| leaf_entry(i as f64)).collect();
    let (a, b) = quadratic_split(entries, 2);
    assert!(a.len() >= 2);
    assert!(b.len() >= 2);
    assert_eq!(a.len() + b.len(), 6);
}

#[test]
fn split_partitions_all_entries_exactly_once() {
    let entries: Vec<Entry> = (0..10).map(|i| leaf_entry(i as f64)).collect();
    let total = entries.len();
    let (a, b) = quadratic_split(entries, 3);
    assert_eq!(a.len() + b.len(), total);
}
