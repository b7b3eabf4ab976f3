//! Structural change detector (spec §4.5): produces a minimal operation
//! list from an old/new content pair.

use super::ops::{DeltaOp, Path, PathSegment, TextEdit};
use serde_json::{Map, Value};
use std::collections::HashSet;

const TEXT_DIFF_MIN_LEN: usize = 100;
const SET_VALUE_REWRITE_RATIO: f64 = 3.0;

pub fn detect_changes(old: &Value, new: &Value) -> Vec<DeltaOp> {
    diff_at(&Vec::new(), old, new)
}

fn diff_at(path: &Path, old: &Value, new: &Value) -> Vec<DeltaOp> {
    if old == new {
        return Vec::new();
    }
    match (old, new) {
        (Value::Object(o), Value::Object(n)) => diff_objects(path, o, n),
        (Value::Array(o), Value::Array(n)) => diff_arrays(path, o, n),
        (Value::String(o), Value::String(n)) if o.len() >= TEXT_DIFF_MIN_LEN || n.len() >= TEXT_DIFF_MIN_LEN => {
            diff_strings(path, o, n)
        }
        _ => vec![DeltaOp::SetValue { path: path.clone(), new: new.clone(), old: Some(old.clone()) }],
    }
}

fn diff_objects(path: &Path, old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<DeltaOp> {
    let mut ops = Vec::new();
    for key in old.keys() {
        if !new.contains_key(key) {
            let mut p = path.clone();
            p.push(PathSegment::Key(key.clone()));
            ops.push(DeltaOp::DeleteValue { path: p, old: Some(old[key].clone()) });
        }
    }
    for (key, new_val) in new {
        let mut p = path.clone();
        p.push(PathSegment::Key(key.clone()));
        match old.get(key) {
            None => ops.push(DeltaOp::SetValue { path: p, new: new_val.clone(), old: None }),
            Some(old_val) if old_val != new_val => ops.extend(diff_at(&p, old_val, new_val)),
            _ => {}
        }
    }
    ops
}

fn longest_common_subsequence(a: &[Value], b: &[Value]) -> Vec<(usize, usize)> {
    let n = a.len();
    let m = b.len();
    let mut dp = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            dp[i][j] = if a[i] == b[j] { dp[i + 1][j + 1] + 1 } else { dp[i + 1][j].max(dp[i][j + 1]) };
        }
    }
    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if dp[i + 1][j] >= dp[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

fn diff_arrays(path: &Path, old: &[Value], new: &[Value]) -> Vec<DeltaOp> {
    let matched = longest_common_subsequence(old, new);
    let matched_old: HashSet<usize> = matched.iter().map(|(i, _)| *i).collect();
    let matched_new: HashSet<usize> = matched.iter().map(|(_, j)| *j).collect();

    let mut ops = Vec::new();
    let mut to_delete: Vec<usize> = (0..old.len()).filter(|i| !matched_old.contains(i)).collect();
    to_delete.sort_unstable_by(|a, b| b.cmp(a));
    for idx in to_delete {
        ops.push(DeltaOp::ArrayDelete { path: path.clone(), index: idx, old: Some(old[idx].clone()) });
    }

    let mut to_insert: Vec<usize> = (0..new.len()).filter(|j| !matched_new.contains(j)).collect();
    to_insert.sort_unstable();
    for idx in to_insert {
        ops.push(DeltaOp::ArrayInsert { path: path.clone(), index: idx, value: new[idx].clone() });
    }
    ops
}

fn diff_strings(path: &Path, old: &str, new: &str) -> Vec<DeltaOp> {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let mut prefix = 0;
    while prefix < old_chars.len() && prefix < new_chars.len() && old_chars[prefix] == new_chars[prefix] {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < old_chars.len() - prefix
        && suffix < new_chars.len() - prefix
        && old_chars[old_chars.len() - 1 - suffix] == new_chars[new_chars.len() - 1 - suffix]
    {
        suffix += 1;
    }

    let old_mid: String = old_chars[prefix..old_chars.len() - suffix].iter().collect();
    let new_mid: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();

    let changed_len = old_mid.chars().count().max(new_mid.chars().count());
    let unchanged_len = old_chars.len().min(new_chars.len()).saturating_sub(changed_len).max(1);
    if changed_len as f64 > SET_VALUE_REWRITE_RATIO * unchanged_len as f64 {
        return vec![DeltaOp::SetValue {
            path: path.clone(),
            new: Value::String(new.to_string()),
            old: Some(Value::String(old.to_string())),
        }];
    }

    vec![DeltaOp::TextDiff {
        path: path.clone(),
        edits: vec![TextEdit::Replace { pos: prefix, old_text: old_mid, new_text: new_mid }],
    }]
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod detector_tests;
