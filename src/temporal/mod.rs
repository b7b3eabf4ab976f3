//! Timestamp-keyed secondary index (C7, spec §4.4) and the front-end
//! that composes it with the R-tree.

pub mod combined;

use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Newtype giving `f64` a total order via `total_cmp`, since timestamps
/// here are never `NaN` and `BTreeMap` needs `Ord`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeKey(pub f64);

impl Eq for TimeKey {}
impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

pub struct TemporalIndex {
    buckets: BTreeMap<TimeKey, HashSet<Uuid>>,
    /// Trades memory for precision: timestamps are rounded to this
    /// resolution before bucketing, so many nearby events share a bucket.
    resolution: f64,
}

impl TemporalIndex {
    pub fn new(resolution: f64) -> Self {
        Self { buckets: BTreeMap::new(), resolution }
    }

    fn bucket_key(&self, t: f64) -> TimeKey {
        if self.resolution <= 0.0 {
            TimeKey(t)
        } else {
            TimeKey((t / self.resolution).round() * self.resolution)
        }
    }

    pub fn insert(&mut self, t: f64, id: Uuid) {
        self.buckets.entry(self.bucket_key(t)).or_default().insert(id);
    }

    pub fn remove(&mut self, t: f64, id: Uuid) -> bool {
        let key = self.bucket_key(t);
        let Some(set) = self.buckets.get_mut(&key) else { return false };
        let removed = set.remove(&id);
        if set.is_empty() {
            self.buckets.remove(&key);
        }
        removed
    }

    pub fn range(&self, lo: f64, hi: f64) -> Vec<Uuid> {
        self.buckets
            .range(TimeKey(lo)..=TimeKey(hi))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Estimated candidate count for a time range, used by the combined
    /// index to decide which predicate to evaluate first.
    pub fn estimate(&self, lo: f64, hi: f64) -> usize {
        self.buckets.range(TimeKey(lo)..=TimeKey(hi)).map(|(_, ids)| ids.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Default for TemporalIndex {
    fn default() -> Self {
        Self::new(0.1)
    }
}

#[cfg(test)]
#[path = "temporal_tests.rs"]
mod temporal_tests;
