//! State reconstruction and history navigation (C10, spec §4.7).

use crate::delta::ops::{Path, PathSegment};
use crate::delta::{DeltaChain, DeltaOp, DeltaStore};
use crate::error::MeridianResult;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Rebuilds the in-memory chain for `node_id` from persisted delta records,
/// installing any persisted checkpoints as fast-forward bases.
pub fn load_chain(
    store: &DeltaStore,
    node_id: Uuid,
    origin_content: Value,
    origin_timestamp: f64,
) -> MeridianResult<DeltaChain> {
    let mut chain = DeltaChain::new(node_id, origin_content, origin_timestamp);
    for record in store.for_node(node_id)? {
        let checkpoint = record.checkpoint_content().cloned();
        let timestamp = record.timestamp;
        chain.append(record)?;
        if let Some(content) = checkpoint {
            chain.install_checkpoint(timestamp, content);
        }
    }
    Ok(chain)
}

pub fn state_at(
    store: &DeltaStore,
    node_id: Uuid,
    origin_content: Value,
    origin_timestamp: f64,
    target_t: f64,
) -> MeridianResult<Value> {
    let chain = load_chain(store, node_id, origin_content, origin_timestamp)?;
    chain.reconstruct_at(target_t)
}

/// Walks the loaded chain once, producing one state per requested timestamp.
pub fn states_at(
    store: &DeltaStore,
    node_id: Uuid,
    origin_content: Value,
    origin_timestamp: f64,
    mut targets: Vec<f64>,
) -> MeridianResult<Vec<(f64, Value)>> {
    let chain = load_chain(store, node_id, origin_content, origin_timestamp)?;
    targets.sort_by(f64::total_cmp);
    targets.into_iter().map(|t| Ok((t, chain.reconstruct_at(t)?))).collect()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Comparison {
    pub added: Vec<(Path, Value)>,
    pub removed: Vec<(Path, Value)>,
    pub changed: Vec<(Path, Value, Value)>,
}

fn append_index(mut path: Path, index: usize) -> Path {
    path.push(PathSegment::Index(index));
    path
}

fn classify(ops: Vec<DeltaOp>, out: &mut Comparison) {
    for op in ops {
        match op {
            DeltaOp::SetValue { path, new, old: None } => out.added.push((path, new)),
            DeltaOp::SetValue { path, new, old: Some(old) } => out.changed.push((path, old, new)),
            DeltaOp::DeleteValue { path, old } => out.removed.push((path, old.unwrap_or(Value::Null))),
            DeltaOp::ArrayInsert { path, index, value } => out.added.push((append_index(path, index), value)),
            DeltaOp::ArrayDelete { path, index, old } => {
                out.removed.push((append_index(path, index), old.unwrap_or(Value::Null)))
            }
            // a textual diff is reported as a single changed leaf; the edit
            // script itself is available from get_delta_history if needed.
            DeltaOp::TextDiff { path, .. } => out.changed.push((path, Value::Null, Value::Null)),
            DeltaOp::Composite { ops } => classify(ops, out),
        }
    }
}

/// Diffs the states at `t1` and `t2` via the same structural matcher the
/// change detector uses, bucketed into added/removed/changed.
pub fn compare(
    store: &DeltaStore,
    node_id: Uuid,
    origin_content: Value,
    origin_timestamp: f64,
    t1: f64,
    t2: f64,
) -> MeridianResult<Comparison> {
    let chain = load_chain(store, node_id, origin_content, origin_timestamp)?;
    let s1 = chain.reconstruct_at(t1)?;
    let s2 = chain.reconstruct_at(t2)?;
    let ops = crate::delta::detect_changes(&s1, &s2);
    let mut out = Comparison::default();
    classify(ops, &mut out);
    Ok(out)
}

/// `(timestamp, summary)` pairs in ascending time order.
pub fn get_delta_history(store: &DeltaStore, node_id: Uuid) -> MeridianResult<Vec<(f64, String)>> {
    let records = store.for_node(node_id)?;
    Ok(records
        .iter()
        .map(|r| {
            let summary = if r.is_checkpoint() {
                "checkpoint".to_string()
            } else {
                format!("{} operation(s)", r.operations.len())
            };
            (r.timestamp, summary)
        })
        .collect())
}

/// Up to `n` near-evenly-spaced delta timestamps, sampled from the node's
/// full history (supplements the spec's timeline helpers with a way to
/// render a sparse overview without walking every delta).
pub fn get_significant_timestamps(store: &DeltaStore, node_id: Uuid, n: usize) -> MeridianResult<Vec<f64>> {
    let records = store.for_node(node_id)?;
    if n == 0 || records.is_empty() {
        return Ok(Vec::new());
    }
    if records.len() <= n {
        return Ok(records.iter().map(|r| r.timestamp).collect());
    }
    let stride = records.len() as f64 / n as f64;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let idx = ((i as f64) * stride).round() as usize;
        out.push(records[idx.min(records.len() - 1)].timestamp);
    }
    out.dedup();
    Ok(out)
}

/// Bins delta timestamps into fixed-size windows, counting deltas per bin.
/// Keyed by `floor(timestamp / window)`; multiply by `window` to recover
/// each bin's start time.
pub fn get_change_frequency(store: &DeltaStore, node_id: Uuid, window: f64) -> MeridianResult<HashMap<i64, usize>> {
    let records = store.for_node(node_id)?;
    let mut bins: HashMap<i64, usize> = HashMap::new();
    if window <= 0.0 {
        return Ok(bins);
    }
    for record in records {
        let bin = (record.timestamp / window).floor() as i64;
        *bins.entry(bin).or_insert(0) += 1;
    }
    Ok(bins)
}

#[cfg(test)]
#[path = "reconstruct_tests.rs"]
mod reconstruct_tests;
