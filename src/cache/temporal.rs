//! Temporal-aware cache layer: scores entries by a blend of temporal
//! relevance and recency, evicting the lowest scorer on overflow.
//!
//! Grounded on `TemporalAwareCache` in `original_source/src/storage/cache.py`,
//! with scores computed live at eviction time rather than cached, so
//! `set_time_window` never leaves stale scores behind.

use super::NodeCache;
use crate::node::Node;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Timestamps beyond this distance from the window get zero temporal relevance.
const MAX_TIME_DIFF: f64 = 60.0 * 60.0 * 24.0 * 30.0;

struct Entry {
    node: Node,
    last_access: u64,
}

struct Inner {
    entries: HashMap<Uuid, Entry>,
    access_counter: u64,
    time_window: Option<(f64, f64)>,
}

pub struct TemporalAwareCache {
    max_size: usize,
    time_weight: f64,
    inner: Mutex<Inner>,
}

impl TemporalAwareCache {
    pub fn new(max_size: usize, time_weight: f64) -> Self {
        Self {
            max_size: max_size.max(1),
            time_weight: time_weight.clamp(0.0, 1.0),
            inner: Mutex::new(Inner { entries: HashMap::new(), access_counter: 0, time_window: None }),
        }
    }

    pub fn set_time_window(&self, lo: f64, hi: f64) {
        self.inner.lock().time_window = Some((lo, hi));
    }

    fn temporal_relevance(window: Option<(f64, f64)>, t: f64) -> f64 {
        match window {
            None => 0.0,
            Some((lo, hi)) if t >= lo && t <= hi => 1.0,
            Some((lo, hi)) => {
                let diff = if t < lo { lo - t } else { t - hi };
                1.0 - (diff / MAX_TIME_DIFF).min(1.0)
            }
        }
    }

    fn score(&self, window: Option<(f64, f64)>, access_counter: u64, entry: &Entry) -> f64 {
        let temporal = Self::temporal_relevance(window, entry.node.position.t);
        let recency = 1.0 - access_counter.saturating_sub(entry.last_access) as f64 / access_counter.max(1) as f64;
        self.time_weight * temporal + (1.0 - self.time_weight) * recency
    }

    /// Invalidates every entry whose time coordinate falls in `[lo, hi]`,
    /// returning how many were removed.
    pub fn invalidate_time_range(&self, lo: f64, hi: f64) -> usize {
        let mut inner = self.inner.lock();
        let victims: Vec<Uuid> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.node.position.t >= lo && e.node.position.t <= hi)
            .map(|(id, _)| *id)
            .collect();
        for id in &victims {
            inner.entries.remove(id);
        }
        victims.len()
    }
}

impl NodeCache for TemporalAwareCache {
    fn get(&self, id: Uuid) -> Option<Node> {
        let mut inner = self.inner.lock();
        inner.access_counter += 1;
        let counter = inner.access_counter;
        inner.entries.get_mut(&id).map(|entry| {
            entry.last_access = counter;
            entry.node.clone()
        })
    }

    fn put(&self, node: Node) {
        let mut inner = self.inner.lock();
        inner.access_counter += 1;
        let counter = inner.access_counter;
        inner.entries.insert(node.id, Entry { node, last_access: counter });

        if inner.entries.len() > self.max_size {
            let window = inner.time_window;
            let worst = inner
                .entries
                .iter()
                .map(|(id, e)| (*id, self.score(window, counter, e)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id);
            if let Some(id) = worst {
                inner.entries.remove(&id);
            }
        }
    }

    fn invalidate(&self, id: Uuid) {
        self.inner.lock().entries.remove(&id);
    }

    fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.access_counter = 0;
    }

    fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

#[cfg(test)]
#[path = "temporal_tests.rs"]
mod temporal_tests;
