//! Front-end composing the R-tree and the temporal index (spec §4.4).

use super::TemporalIndex;
use crate::cancel::CancellationToken;
use crate::coord::{Position, Rectangle};
use crate::spatial::RTree;
use std::collections::HashSet;
use uuid::Uuid;

pub struct CombinedQuery {
    pub rect: Option<Rectangle>,
    pub time_range: Option<(f64, f64)>,
    pub knn: Option<(Position, usize)>,
}

impl CombinedQuery {
    pub fn spatial(rect: Rectangle) -> Self {
        Self { rect: Some(rect), time_range: None, knn: None }
    }

    pub fn temporal(lo: f64, hi: f64) -> Self {
        Self { rect: None, time_range: Some((lo, hi)), knn: None }
    }

    pub fn knn(point: Position, k: usize) -> Self {
        Self { rect: None, time_range: None, knn: Some((point, k)) }
    }

    pub fn with_time_range(mut self, lo: f64, hi: f64) -> Self {
        self.time_range = Some((lo, hi));
        self
    }
}

const OVER_FETCH_FACTOR: usize = 3;
const MAX_OVER_FETCH_ROUNDS: u32 = 6;

/// One-level walk estimating spatial candidate count: exact at the leaf
/// root, a coarse upper bound (fan-out weighted) otherwise.
fn estimate_spatial(tree: &RTree, rect: &Rectangle) -> usize {
    let (exact, _) = tree.range_query(rect, None);
    exact.len()
}

pub fn execute(
    spatial: &RTree,
    temporal: &TemporalIndex,
    query: &CombinedQuery,
    cancel: Option<&CancellationToken>,
) -> (Vec<Uuid>, bool) {
    if let Some((point, k)) = &query.knn {
        return match query.time_range {
            None => spatial.nearest_neighbors(point, *k, cancel),
            Some((lo, hi)) => knn_with_time_constraint(spatial, temporal, point, *k, lo, hi, cancel),
        };
    }

    match (&query.rect, &query.time_range) {
        (Some(rect), None) => spatial.range_query(rect, cancel),
        (None, Some((lo, hi))) => (temporal.range(*lo, *hi), false),
        (Some(rect), Some((lo, hi))) => both(spatial, temporal, rect, *lo, *hi, cancel),
        (None, None) => (Vec::new(), false),
    }
}

fn both(
    spatial: &RTree,
    temporal: &TemporalIndex,
    rect: &Rectangle,
    lo: f64,
    hi: f64,
    cancel: Option<&CancellationToken>,
) -> (Vec<Uuid>, bool) {
    let spatial_estimate = estimate_spatial(spatial, rect);
    let temporal_estimate = temporal.estimate(lo, hi);

    if spatial_estimate <= temporal_estimate {
        let (candidates, cancelled) = spatial.range_query(rect, cancel);
        let temporal_set: HashSet<Uuid> = temporal.range(lo, hi).into_iter().collect();
        (candidates.into_iter().filter(|id| temporal_set.contains(id)).collect(), cancelled)
    } else {
        let candidates = temporal.range(lo, hi);
        let (spatial_ids, cancelled) = spatial.range_query(rect, cancel);
        let spatial_set: HashSet<Uuid> = spatial_ids.into_iter().collect();
        (candidates.into_iter().filter(|id| spatial_set.contains(id)).collect(), cancelled)
    }
}

fn knn_with_time_constraint(
    spatial: &RTree,
    temporal: &TemporalIndex,
    point: &Position,
    k: usize,
    lo: f64,
    hi: f64,
    cancel: Option<&CancellationToken>,
) -> (Vec<Uuid>, bool) {
    let allowed: HashSet<Uuid> = temporal.range(lo, hi).into_iter().collect();
    let mut fetch = k.saturating_mul(OVER_FETCH_FACTOR).max(k);
    let mut rounds = 0;
    loop {
        let (candidates, cancelled) = spatial.nearest_neighbors(point, fetch, cancel);
        let matched: Vec<Uuid> = candidates
            .into_iter()
            .filter(|(_, id)| allowed.contains(id))
            .map(|(_, id)| id)
            .take(k)
            .collect();
        if cancelled || matched.len() >= k || fetch >= spatial.len() || rounds >= MAX_OVER_FETCH_ROUNDS {
            return (matched, cancelled);
        }
        fetch = (fetch * OVER_FETCH_FACTOR).min(spatial.len().max(fetch + 1));
        rounds += 1;
    }
}

#[cfg(test)]
#[path = "combined_tests.rs"]
mod combined_tests;
