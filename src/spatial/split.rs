//! Quadratic-cost split (spec §4.3): pick the worst-fitting seed pair,
//! then greedily assign the rest to whichever group grows least.

use super::tree::Entry;
use crate::coord::Rectangle;

fn pick_seeds(entries: &[Entry]) -> (usize, usize) {
    let mut best = (0, 1, f64::NEG_INFINITY);
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let merged = entries[i].mbr.merge(&entries[j].mbr);
            let waste = merged.area() - entries[i].mbr.area() - entries[j].mbr.area();
            if waste > best.2 {
                best = (i, j, waste);
            }
        }
    }
    (best.0, best.1)
}

fn pick_next(remaining: &[(usize, Entry)], rect_a: &Rectangle, rect_b: &Rectangle) -> (usize, bool) {
    let mut chosen = (0, f64::NEG_INFINITY, true);
    for (idx, (_, entry)) in remaining.iter().enumerate() {
        let enlarge_a = rect_a.merge(&entry.mbr).area() - rect_a.area();
        let enlarge_b = rect_b.merge(&entry.mbr).area() - rect_b.area();
        let diff = (enlarge_a - enlarge_b).abs();
        if diff > chosen.1 {
            chosen = (idx, diff, enlarge_a <= enlarge_b);
        }
    }
    (chosen.0, chosen.2)
}

/// Splits `entries` (which overflow a single node) into two groups, each
/// respecting `min_entries` as a floor.
pub fn quadratic_split(mut entries: Vec<Entry>, min_entries: usize) -> (Vec<Entry>, Vec<Entry>) {
    let (seed_a, seed_b) = pick_seeds(&entries);
    let entry_b = entries.remove(seed_b.max(seed_a));
    let entry_a = entries.remove(seed_a.min(seed_b));

    let mut rect_a = entry_a.mbr;
    let mut rect_b = entry_b.mbr;
    let mut group_a = vec![entry_a];
    let mut group_b = vec![entry_b];

    let mut remaining: Vec<(usize, Entry)> = entries.into_iter().enumerate().collect();

    while !remaining.is_empty() {
        let total_remaining = remaining.len();
        if group_a.len() + total_remaining <= min_entries {
            for (_, e) in remaining.drain(..) {
                rect_a = rect_a.merge(&e.mbr);
                group_a.push(e);
            }
            break;
        }
        if group_b.len() + total_remaining <= min_entries {
            for (_, e) in remaining.drain(..) {
                rect_b = rect_b.merge(&e.mbr);
                group_b.push(e);
            }
            break;
        }

        let (idx, goes_to_a) = pick_next(&remaining, &rect_a, &rect_b);
        let (_, entry) = remaining.remove(idx);
        if goes_to_a {
            rect_a = rect_a.merge(&entry.mbr);
            group_a.push(entry);
        } else {
            rect_b = rect_b.merge(&entry.mbr);
            group_b.push(entry);
        }
    }

    (group_a, group_b)
}

#[cfg(test)]
#[path = "split_tests.rs"]
mod split_tests;
