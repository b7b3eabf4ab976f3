use super::*;
use crate::coord::Position;
use serde_json::json;

fn node_at(t: f64) -> Node {
    Node::new(Position::new(t, 1.0, 0.0).unwrap(), json!({}))
}

#[test]
fn put_then_get_round_trips() {
    let cache = TemporalFrequencyCache::new(4, 0.3, 0.3, 0.4);
    let node = node_at(1.0);
    cache.put(node.clone());
    assert_eq!(cache.get(node.id).unwrap().id, node.id);
}

#[test]
fn frequent_access_raises_score_over_untouched_entry() {
    let cache = TemporalFrequencyCache::new(10, 0.0, 1.0, 0.0);
    let hot = node_at(1.0);
    let cold = node_at(2.0);
    cache.put(hot.clone());
    cache.put(cold.clone());
    for _ in 0..5 {
        cache.get(hot.id);
    }

    let inner = cache.inner.lock();
    let counter = inner.access_counter;
    let hot_score = cache.score(None, counter, &inner.entries[&hot.id]);
    let cold_score = cache.score(None, counter, &inner.entries[&cold.id]);
    assert!(hot_score > cold_score);
}

#[test]
fn invalidate_and_clear_remove_entries() {
    let cache = TemporalFrequencyCache::new(4, 0.3, 0.3, 0.4);
    let node = node_at(1.0);
    cache.put(node.clone());
    cache.invalidate(node.id);
    assert!(cache.get(node.id).is_none());

    cache.put(node_at(3.0));
    cache.put(node_at(4.0));
    cache.clear();
    assert_eq!(cache.len(), 0);
}
