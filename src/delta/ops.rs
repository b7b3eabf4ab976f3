//! Reversible edit operations over JSON-like content trees (spec §4.5).
//!
//! Grounded on `original_source/src/delta/operations.py`: path navigation
//! creates intermediate maps on write, reverses require a recorded old
//! value, and array edits clamp out-of-range indices rather than erroring.

use crate::error::{MeridianError, MeridianResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

pub type Path = Vec<PathSegment>;

pub fn key_path(segments: &[&str]) -> Path {
    segments.iter().map(|s| PathSegment::Key(s.to_string())).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TextEdit {
    Insert { pos: usize, text: String },
    /// `text` is the content being removed, recorded so the edit can be reversed.
    Delete { pos: usize, text: String },
    Replace { pos: usize, old_text: String, new_text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op")]
pub enum DeltaOp {
    #[serde(rename = "set")]
    SetValue { path: Path, new: Value, old: Option<Value> },
    #[serde(rename = "del")]
    DeleteValue { path: Path, old: Option<Value> },
    #[serde(rename = "ainsert")]
    ArrayInsert { path: Path, index: usize, value: Value },
    #[serde(rename = "adel")]
    ArrayDelete { path: Path, index: usize, old: Option<Value> },
    #[serde(rename = "tdiff")]
    TextDiff { path: Path, edits: Vec<TextEdit> },
    #[serde(rename = "composite")]
    Composite { ops: Vec<DeltaOp> },
}

fn navigate<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let mut current = value;
    for seg in path {
        current = match (seg, current) {
            (PathSegment::Key(k), Value::Object(map)) => map.get(k)?,
            (PathSegment::Index(i), Value::Array(arr)) => arr.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Navigates to `path`, creating intermediate objects for missing `Key`
/// segments. Fails if an `Index` segment doesn't resolve to an existing array slot.
fn navigate_mut<'a>(value: &'a mut Value, path: &[PathSegment]) -> MeridianResult<&'a mut Value> {
    let mut current = value;
    for seg in path {
        current = match seg {
            PathSegment::Key(k) => {
                if !current.is_object() {
                    *current = Value::Object(Map::new());
                }
                current
                    .as_object_mut()
                    .unwrap()
                    .entry(k.clone())
                    .or_insert(Value::Null)
            }
            PathSegment::Index(i) => current
                .as_array_mut()
                .and_then(|arr| arr.get_mut(*i))
                .ok_or_else(|| MeridianError::InvariantViolation(format!("path index {i} out of range")))?,
        };
    }
    Ok(current)
}

fn set_at(content: &Value, path: &[PathSegment], new: Value) -> MeridianResult<Value> {
    let mut out = content.clone();
    if path.is_empty() {
        return Ok(new);
    }
    let (last, prefix) = path.split_last().unwrap();
    let parent = navigate_mut(&mut out, prefix)?;
    match last {
        PathSegment::Key(k) => {
            if !parent.is_object() {
                *parent = Value::Object(Map::new());
            }
            parent.as_object_mut().unwrap().insert(k.clone(), new);
        }
        PathSegment::Index(i) => {
            let arr = parent
                .as_array_mut()
                .ok_or_else(|| MeridianError::InvariantViolation("SetValue index path requires an array".into()))?;
            if *i < arr.len() {
                arr[*i] = new;
            } else {
                arr.push(new);
            }
        }
    }
    Ok(out)
}

fn delete_at(content: &Value, path: &[PathSegment]) -> Value {
    if path.is_empty() {
        return content.clone();
    }
    let mut out = content.clone();
    let (last, prefix) = path.split_last().unwrap();
    let Some(parent) = navigate_parent_mut(&mut out, prefix) else { return out };
    match last {
        PathSegment::Key(k) => {
            if let Some(map) = parent.as_object_mut() {
                map.remove(k);
            }
        }
        PathSegment::Index(i) => {
            if let Some(arr) = parent.as_array_mut() {
                if *i < arr.len() {
                    arr.remove(*i);
                }
            }
        }
    }
    out
}

/// Like `navigate_mut` but never creates intermediates; missing paths
/// yield `None` so delete-on-missing-path is a documented no-op.
fn navigate_parent_mut<'a>(value: &'a mut Value, path: &[PathSegment]) -> Option<&'a mut Value> {
    let mut current = value;
    for seg in path {
        current = match (seg, current) {
            (PathSegment::Key(k), Value::Object(map)) => map.get_mut(k)?,
            (PathSegment::Index(i), Value::Array(arr)) => arr.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

fn array_at<'a>(content: &'a Value, path: &[PathSegment]) -> Option<&'a Vec<Value>> {
    navigate(content, path).and_then(|v| v.as_array())
}

impl DeltaOp {
    pub fn apply(&self, content: &Value) -> MeridianResult<Value> {
        match self {
            DeltaOp::SetValue { path, new, .. } => set_at(content, path, new.clone()),
            DeltaOp::DeleteValue { path, .. } => Ok(delete_at(content, path)),
            DeltaOp::ArrayInsert { path, index, value } => {
                let len = array_at(content, path).map(|a| a.len()).unwrap_or(0);
                let clamped = (*index).min(len);
                let mut out = content.clone();
                let parent = navigate_mut(&mut out, path)?;
                if !parent.is_array() {
                    *parent = Value::Array(Vec::new());
                }
                parent.as_array_mut().unwrap().insert(clamped, value.clone());
                Ok(out)
            }
            DeltaOp::ArrayDelete { path, index, .. } => {
                let mut out = content.clone();
                if let Some(parent) = navigate_parent_mut(&mut out, path) {
                    if let Some(arr) = parent.as_array_mut() {
                        if *index < arr.len() {
                            arr.remove(*index);
                        }
                    }
                }
                Ok(out)
            }
            DeltaOp::TextDiff { path, edits } => {
                let current = array_text_or_string(content, path)?;
                let mut sorted = edits.clone();
                sorted.sort_by(|a, b| edit_pos(b).cmp(&edit_pos(a)));
                let mut text = current;
                for edit in &sorted {
                    text = apply_text_edit(&text, edit)?;
                }
                set_at(content, path, Value::String(text))
            }
            DeltaOp::Composite { ops } => {
                let mut current = content.clone();
                for op in ops {
                    current = op.apply(&current)?;
                }
                Ok(current)
            }
        }
    }

    pub fn reverse(&self, content: &Value) -> MeridianResult<Value> {
        match self {
            DeltaOp::SetValue { path, old, .. } => match old {
                Some(old) => set_at(content, path, old.clone()),
                None => Err(MeridianError::IrreversibleDelta(
                    "SetValue has no recorded old value".into(),
                )),
            },
            DeltaOp::DeleteValue { path, old } => match old {
                Some(old) => set_at(content, path, old.clone()),
                None => Ok(content.clone()),
            },
            DeltaOp::ArrayInsert { path, index, .. } => {
                let mut out = content.clone();
                if let Some(parent) = navigate_parent_mut(&mut out, path) {
                    if let Some(arr) = parent.as_array_mut() {
                        if *index < arr.len() {
                            arr.remove(*index);
                        }
                    }
                }
                Ok(out)
            }
            DeltaOp::ArrayDelete { path, index, old } => {
                let Some(old) = old else { return Ok(content.clone()) };
                let mut out = content.clone();
                let parent = navigate_mut(&mut out, path)?;
                if !parent.is_array() {
                    *parent = Value::Array(Vec::new());
                }
                let arr = parent.as_array_mut().unwrap();
                let clamped = (*index).min(arr.len());
                arr.insert(clamped, old.clone());
                Ok(out)
            }
            DeltaOp::TextDiff { path, edits } => {
                let current = array_text_or_string(content, path)?;
                let mut inverses: Vec<TextEdit> = edits.iter().map(invert_edit).collect();
                inverses.sort_by_key(edit_pos);
                let mut text = current;
                for edit in &inverses {
                    text = apply_text_edit(&text, edit)?;
                }
                set_at(content, path, Value::String(text))
            }
            DeltaOp::Composite { ops } => {
                let mut current = content.clone();
                for op in ops.iter().rev() {
                    current = op.reverse(&current)?;
                }
                Ok(current)
            }
        }
    }
}

fn array_text_or_string(content: &Value, path: &[PathSegment]) -> MeridianResult<String> {
    match navigate(content, path) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Ok(String::new()),
        Some(_) => Err(MeridianError::InvariantViolation("TextDiff path does not resolve to a string".into())),
    }
}

fn edit_pos(edit: &TextEdit) -> usize {
    match edit {
        TextEdit::Insert { pos, .. } => *pos,
        TextEdit::Delete { pos, .. } => *pos,
        TextEdit::Replace { pos, .. } => *pos,
    }
}

fn invert_edit(edit: &TextEdit) -> TextEdit {
    match edit {
        TextEdit::Insert { pos, text } => TextEdit::Delete { pos: *pos, text: text.clone() },
        TextEdit::Delete { pos, text } => TextEdit::Insert { pos: *pos, text: text.clone() },
        TextEdit::Replace { pos, old_text, new_text } => {
            TextEdit::Replace { pos: *pos, old_text: new_text.clone(), new_text: old_text.clone() }
        }
    }
}

fn apply_text_edit(text: &str, edit: &TextEdit) -> MeridianResult<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = chars.clone();
    match edit {
        TextEdit::Insert { pos, text: insert_text } => {
            let at = (*pos).min(out.len());
            out.splice(at..at, insert_text.chars());
        }
        TextEdit::Delete { pos, text: deleted } => {
            let at = (*pos).min(out.len());
            let end = (at + deleted.chars().count()).min(out.len());
            out.splice(at..end, std::iter::empty());
        }
        TextEdit::Replace { pos, old_text, new_text } => {
            let at = (*pos).min(out.len());
            let end = (at + old_text.chars().count()).min(out.len());
            out.splice(at..end, new_text.chars());
        }
    }
    Ok(out.into_iter().collect())
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod ops_tests;
