//! Multi-layer node caches (C11, spec §4.8).
//!
//! Grounded on `original_source/src/storage/cache.py`: an abstract
//! `NodeCache` interface implemented by several scoring strategies, plus a
//! `CacheChain` that tries each layer in order and hoists hits upward.

pub mod frequency;
pub mod lru;
pub mod predictive;
pub mod temporal;

pub use frequency::TemporalFrequencyCache;
pub use lru::LruNodeCache;
pub use predictive::PredictivePrefetchCache;
pub use temporal::TemporalAwareCache;

use crate::node::Node;
use uuid::Uuid;

pub trait NodeCache: Send + Sync {
    fn get(&self, id: Uuid) -> Option<Node>;
    fn put(&self, node: Node);
    fn invalidate(&self, id: Uuid);
    fn clear(&self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered list of cache layers; `get` tries each in turn and hoists a hit
/// into every earlier (faster) layer. `put`/`invalidate`/`clear` fan out to all.
pub struct CacheChain {
    layers: Vec<Box<dyn NodeCache>>,
}

impl CacheChain {
    pub fn new(layers: Vec<Box<dyn NodeCache>>) -> Self {
        Self { layers }
    }

    pub fn get(&self, id: Uuid) -> Option<Node> {
        for i in 0..self.layers.len() {
            if let Some(node) = self.layers[i].get(id) {
                for earlier in &self.layers[..i] {
                    earlier.put(node.clone());
                }
                return Some(node);
            }
        }
        None
    }

    pub fn put(&self, node: Node) {
        for layer in &self.layers {
            layer.put(node.clone());
        }
    }

    pub fn invalidate(&self, id: Uuid) {
        for layer in &self.layers {
            layer.invalidate(id);
        }
    }

    pub fn clear(&self) {
        for layer in &self.layers {
            layer.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(|l| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod cache_tests;
