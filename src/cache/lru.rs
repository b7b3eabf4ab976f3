//! Plain LRU cache layer. Grounded on `LRUCache` in
//! `original_source/src/storage/cache.py`: move-to-back on `get`, evict
//! the front on overflow.

use super::NodeCache;
use crate::node::Node;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use uuid::Uuid;

pub struct LruNodeCache {
    inner: Mutex<LruCache<Uuid, Node>>,
}

impl LruNodeCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self { inner: Mutex::new(LruCache::new(cap)) }
    }
}

impl NodeCache for LruNodeCache {
    fn get(&self, id: Uuid) -> Option<Node> {
        self.inner.lock().get(&id).cloned()
    }

    fn put(&self, node: Node) {
        self.inner.lock().put(node.id, node);
    }

    fn invalidate(&self, id: Uuid) {
        self.inner.lock().pop(&id);
    }

    fn clear(&self) {
        self.inner.lock().clear();
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
#[path = "lru_tests.rs"]
mod lru_tests;
