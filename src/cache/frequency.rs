//! Temporal + frequency + recency scored cache layer.
//!
//! Grounded on `TemporalFrequencyCache` (referenced from
//! `original_source/src/storage/test_enhanced_cache.py`, whose source file
//! sits alongside `cache.py`): a weighted sum of temporal relevance, access
//! frequency within the current time bucket, and recency.

use super::NodeCache;
use crate::node::Node;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const MAX_TIME_DIFF: f64 = 60.0 * 60.0 * 24.0 * 30.0;
const DEFAULT_BUCKET_SECONDS: f64 = 60.0 * 60.0;
const DEFAULT_RETENTION_BUCKETS: i64 = 24;

struct Entry {
    node: Node,
    last_access: u64,
    bucket_counts: HashMap<i64, u64>,
}

struct Inner {
    entries: HashMap<Uuid, Entry>,
    access_counter: u64,
    time_window: Option<(f64, f64)>,
}

pub struct TemporalFrequencyCache {
    max_size: usize,
    time_weight: f64,
    frequency_weight: f64,
    recency_weight: f64,
    bucket_seconds: f64,
    retention_buckets: i64,
    inner: Mutex<Inner>,
}

fn current_bucket(bucket_seconds: f64) -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64();
    (now / bucket_seconds).floor() as i64
}

impl TemporalFrequencyCache {
    pub fn new(max_size: usize, time_weight: f64, frequency_weight: f64, recency_weight: f64) -> Self {
        Self {
            max_size: max_size.max(1),
            time_weight,
            frequency_weight,
            recency_weight,
            bucket_seconds: DEFAULT_BUCKET_SECONDS,
            retention_buckets: DEFAULT_RETENTION_BUCKETS,
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

    fn record_access(&self, entry: &mut Entry) {
        let bucket = current_bucket(self.bucket_seconds);
        *entry.bucket_counts.entry(bucket).or_insert(0) += 1;
        let floor = bucket - self.retention_buckets;
        entry.bucket_counts.retain(|b, _| *b > floor);
    }

    fn score(&self, window: Option<(f64, f64)>, access_counter: u64, entry: &Entry) -> f64 {
        let temporal = Self::temporal_relevance(window, entry.node.position.t);
        let freq = *entry.bucket_counts.get(&current_bucket(self.bucket_seconds)).unwrap_or(&0) as f64;
        let recency = 1.0 - access_counter.saturating_sub(entry.last_access) as f64 / access_counter.max(1) as f64;
        self.time_weight * temporal + self.frequency_weight * freq + self.recency_weight * recency
    }
}

impl NodeCache for TemporalFrequencyCache {
    fn get(&self, id: Uuid) -> Option<Node> {
        let mut inner = self.inner.lock();
        inner.access_counter += 1;
        let counter = inner.access_counter;
        inner.entries.get_mut(&id).map(|entry| {
            entry.last_access = counter;
            self.record_access(entry);
            entry.node.clone()
        })
    }

    fn put(&self, node: Node) {
        let mut inner = self.inner.lock();
        inner.access_counter += 1;
        let counter = inner.access_counter;
        let entry = inner.entries.entry(node.id).or_insert(Entry { node: node.clone(), last_access: counter, bucket_counts: HashMap::new() });
        entry.node = node;
        entry.last_access = counter;
        self.record_access(entry);

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
#[path = "frequency_tests.rs"]
mod frequency_tests;
