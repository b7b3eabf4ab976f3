use super::*;
use crate::coord::Position;
use serde_json::json;

fn node(id: Uuid) -> Node {
    Node::with_id(id, Position::new(0.0, 1.0, 0.0).unwrap(), json!({}))
}

#[test]
fn chain_get_hoists_hit_into_earlier_layers() {
    let l1 = Box::new(LruNodeCache::new(4));
    let l2 = Box::new(LruNodeCache::new(4));
    let id = Uuid::new_v4();
    l2.put(node(id));

    let chain = CacheChain::new(vec![l1, l2]);
    assert!(chain.get(id).is_some());
    // l1 (the first layer) must now hold the node too.
    assert_eq!(chain.layers[0].len(), 1);
}

#[test]
fn chain_put_fans_out_to_all_layers() {
    let l1 = Box::new(LruNodeCache::new(4));
    let l2 = Box::new(LruNodeCache::new(4));
    let chain = CacheChain::new(vec![l1, l2]);
    chain.put(node(Uuid::new_v4()));
    assert_eq!(chain.len(), 2);
}

#[test]
fn chain_invalidate_and_clear_fan_out() {
    let l1 = Box::new(LruNodeCache::new(4));
    let l2 = Box::new(LruNodeCache::new(4));
    let id = Uuid::new_v4();
    let chain = CacheChain::new(vec![l1, l2]);
    chain.put(node(id));
    chain.invalidate(id);
    assert!(chain.get(id).is_none());

    chain.put(node(Uuid::new_v4()));
    chain.clear();
    assert_eq!(chain.len(), 0);
}
