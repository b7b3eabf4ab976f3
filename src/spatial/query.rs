//! Range and k-nearest-neighbor traversal over the arena (spec §4.3).

use super::tree::{Arena, NodeKey, Pointer};
use crate::cancel::CancellationToken;
use crate::coord::{Position, Rectangle};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use uuid::Uuid;

pub fn range_query(arena: &Arena, root: NodeKey, rect: &Rectangle, cancel: Option<&CancellationToken>) -> (Vec<Uuid>, bool) {
    let mut out = Vec::new();
    let cancelled = range_query_recursive(arena, root, rect, &mut out, cancel);
    (out, cancelled)
}

fn range_query_recursive(
    arena: &Arena,
    key: NodeKey,
    rect: &Rectangle,
    out: &mut Vec<Uuid>,
    cancel: Option<&CancellationToken>,
) -> bool {
    if let Some(token) = cancel {
        if token.is_cancelled() {
            return true;
        }
    }
    let node = arena.get(key);
    for entry in &node.entries {
        if !entry.mbr.intersects(rect) {
            continue;
        }
        match entry.pointer {
            Pointer::Leaf(id) => out.push(id),
            Pointer::Child(child) => {
                if range_query_recursive(arena, child, rect, out, cancel) {
                    return true;
                }
            }
        }
    }
    false
}

#[derive(Clone, Copy)]
struct MinCandidate {
    dist: f64,
    target: Candidate,
}

#[derive(Clone, Copy)]
enum Candidate {
    Node(NodeKey),
    Leaf(Uuid),
}

impl PartialEq for MinCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist
    }
}
impl Eq for MinCandidate {}
impl Ord for MinCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) behaves as a min-heap on distance.
        other.dist.total_cmp(&self.dist)
    }
}
impl PartialOrd for MinCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Copy)]
struct ResultCandidate {
    dist: f64,
    id: Uuid,
}
impl PartialEq for ResultCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.id == other.id
    }
}
impl Eq for ResultCandidate {}
impl Ord for ResultCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.total_cmp(&other.dist).then_with(|| self.id.cmp(&other.id))
    }
}
impl PartialOrd for ResultCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first kNN (spec §4.3): a min-heap of not-yet-expanded nodes/leaves
/// ordered by lower-bound distance, and a bounded max-heap of the current
/// `k` best results so we can prune once it is full.
pub fn nearest_neighbors(
    arena: &Arena,
    root: NodeKey,
    point: &Position,
    k: usize,
    weights: (f64, f64, f64),
    cancel: Option<&CancellationToken>,
) -> (Vec<(f64, Uuid)>, bool) {
    if k == 0 {
        return (Vec::new(), false);
    }
    let mut frontier: BinaryHeap<MinCandidate> = BinaryHeap::new();
    frontier.push(MinCandidate { dist: 0.0, target: Candidate::Node(root) });
    let mut best: BinaryHeap<ResultCandidate> = BinaryHeap::new();
    let mut cancelled = false;

    while let Some(MinCandidate { dist, target }) = frontier.pop() {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                cancelled = true;
                break;
            }
        }
        if best.len() == k {
            if let Some(worst) = best.peek() {
                if dist > worst.dist {
                    break;
                }
            }
        }
        match target {
            Candidate::Leaf(id) => {
                if best.len() < k {
                    best.push(ResultCandidate { dist, id });
                } else if let Some(worst) = best.peek() {
                    if dist < worst.dist {
                        best.pop();
                        best.push(ResultCandidate { dist, id });
                    }
                }
            }
            Candidate::Node(key) => {
                let node = arena.get(key);
                for entry in &node.entries {
                    match entry.pointer {
                        Pointer::Leaf(id) => {
                            let d = entry.mbr.min_dist_to(point, weights);
                            if best.len() < k || best.peek().map(|w| d < w.dist).unwrap_or(true) {
                                frontier.push(MinCandidate { dist: d, target: Candidate::Leaf(id) });
                            }
                        }
                        Pointer::Child(child) => {
                            let d = entry.mbr.min_dist_to(point, weights);
                            if best.len() < k || best.peek().map(|w| d <= w.dist).unwrap_or(true) {
                                frontier.push(MinCandidate { dist: d, target: Candidate::Node(child) });
                            }
                        }
                    }
                }
            }
        }
    }

    let mut results: Vec<(f64, Uuid)> = best.into_sorted_vec().into_iter().map(|c| (c.dist, c.id)).collect();
    results.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    (results, cancelled)
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod query_tests;
