//! R-tree spatial index over cylindrical coordinates (C6, spec §4.3).

pub mod query;
pub mod split;
pub mod tree;

use crate::cancel::CancellationToken;
use crate::coord::{Position, Rectangle};
use std::collections::HashMap;
use tree::{Arena, Entry, NodeKey, Pointer, TreeNode};
use uuid::Uuid;

pub const DEFAULT_MAX_ENTRIES: usize = 50;
pub const DEFAULT_MIN_ENTRIES: usize = 20;

pub struct RTree {
    arena: Arena,
    root: NodeKey,
    max_entries: usize,
    min_entries: usize,
    id_index: HashMap<Uuid, NodeKey>,
    len: usize,
    weights: (f64, f64, f64),
}

impl RTree {
    pub fn new(max_entries: usize, min_entries: usize) -> Self {
        assert!(min_entries >= 1 && min_entries <= max_entries / 2, "require 1 <= m <= M/2");
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode::leaf());
        Self {
            arena,
            root,
            max_entries,
            min_entries,
            id_index: HashMap::new(),
            len: 0,
            weights: (1.0, 1.0, 1.0),
        }
    }

    pub fn with_weights(mut self, weights: (f64, f64, f64)) -> Self {
        self.weights = weights;
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn choose_leaf(&self, pos: &Position) -> NodeKey {
        let mut current = self.root;
        loop {
            let node = self.arena.get(current);
            if node.is_leaf() {
                return current;
            }
            let mut best_idx = 0;
            let mut best_enlargement = f64::INFINITY;
            let mut best_area = f64::INFINITY;
            for (i, entry) in node.entries.iter().enumerate() {
                let enlarged = entry.mbr.enlarge(pos);
                let enlargement = enlarged.area() - entry.mbr.area();
                let area = entry.mbr.area();
                if enlargement < best_enlargement || (enlargement == best_enlargement && area < best_area) {
                    best_enlargement = enlargement;
                    best_area = area;
                    best_idx = i;
                }
            }
            current = match node.entries[best_idx].pointer {
                Pointer::Child(c) => c,
                Pointer::Leaf(_) => unreachable!("internal node holding a leaf pointer"),
            };
        }
    }

    pub fn insert(&mut self, pos: Position, id: Uuid) {
        let leaf_key = self.choose_leaf(&pos);
        let entry = Entry { mbr: Rectangle::from_position(&pos, 0.0), pointer: Pointer::Leaf(id) };
        self.arena.get_mut(leaf_key).entries.push(entry);
        self.id_index.insert(id, leaf_key);
        self.len += 1;
        tracing::debug!(target: "meridian::rtree", %id, "inserted point");
        if self.arena.get(leaf_key).entries.len() > self.max_entries {
            self.split_and_propagate(leaf_key);
        } else {
            self.adjust_tree(leaf_key);
        }
    }

    fn adjust_tree(&mut self, mut key: NodeKey) {
        loop {
            let parent = self.arena.get(key).parent;
            match parent {
                None => break,
                Some(p) => {
                    let rect = self.arena.get(key).bounding_rect();
                    if let Some(idx) = self.arena.entry_index_for_child(p, key) {
                        self.arena.get_mut(p).entries[idx].mbr = rect;
                    }
                    key = p;
                }
            }
        }
    }

    fn split_and_propagate(&mut self, key: NodeKey) {
        let node = self.arena.remove(key);
        let TreeNode { level, parent, entries } = node;
        let (group_a, group_b) = split::quadratic_split(entries, self.min_entries);

        let key_a = self.arena.insert(TreeNode { level, parent, entries: group_a });
        let key_b = self.arena.insert(TreeNode { level, parent, entries: group_b });
        self.reparent_entries(key_a);
        self.reparent_entries(key_b);

        match parent {
            None => {
                let rect_a = self.arena.get(key_a).bounding_rect();
                let rect_b = self.arena.get(key_b).bounding_rect();
                let mut new_root = TreeNode::internal(level + 1);
                new_root.entries.push(Entry { mbr: rect_a, pointer: Pointer::Child(key_a) });
                new_root.entries.push(Entry { mbr: rect_b, pointer: Pointer::Child(key_b) });
                let new_root_key = self.arena.insert(new_root);
                self.arena.get_mut(key_a).parent = Some(new_root_key);
                self.arena.get_mut(key_b).parent = Some(new_root_key);
                self.root = new_root_key;
                tracing::debug!(target: "meridian::rtree", "root split, tree grew by one level");
            }
            Some(parent_key) => {
                let rect_a = self.arena.get(key_a).bounding_rect();
                let rect_b = self.arena.get(key_b).bounding_rect();
                let parent_node = self.arena.get_mut(parent_key);
                parent_node.entries.retain(|e| !matches!(e.pointer, Pointer::Child(k) if k == key));
                parent_node.entries.push(Entry { mbr: rect_a, pointer: Pointer::Child(key_a) });
                parent_node.entries.push(Entry { mbr: rect_b, pointer: Pointer::Child(key_b) });

                if self.arena.get(parent_key).entries.len() > self.max_entries {
                    self.split_and_propagate(parent_key);
                } else {
                    self.adjust_tree(parent_key);
                }
            }
        }
    }

    fn reparent_entries(&mut self, key: NodeKey) {
        let node = self.arena.get(key);
        if node.is_leaf() {
            let ids: Vec<Uuid> = node
                .entries
                .iter()
                .filter_map(|e| match e.pointer {
                    Pointer::Leaf(id) => Some(id),
                    _ => None,
                })
                .collect();
            for id in ids {
                self.id_index.insert(id, key);
            }
        } else {
            let children: Vec<NodeKey> = node
                .entries
                .iter()
                .filter_map(|e| match e.pointer {
                    Pointer::Child(c) => Some(c),
                    _ => None,
                })
                .collect();
            for c in children {
                self.arena.get_mut(c).parent = Some(key);
            }
        }
    }

    /// `old_pos` is unused (item identity is tracked by `id`, not position)
    /// but kept in the signature for parity with the documented interface.
    pub fn delete(&mut self, _old_pos: &Position, id: Uuid) -> bool {
        let leaf_key = match self.id_index.get(&id) {
            Some(k) => *k,
            None => return false,
        };
        let node = self.arena.get_mut(leaf_key);
        let before = node.entries.len();
        node.entries.retain(|e| !matches!(e.pointer, Pointer::Leaf(i) if i == id));
        if node.entries.len() == before {
            return false;
        }
        self.id_index.remove(&id);
        self.len -= 1;
        tracing::debug!(target: "meridian::rtree", %id, "deleted point");
        self.condense_tree(leaf_key);
        true
    }

    /// `delete(old_pos, id); insert(new_pos, id)`. Succeeds even if delete misses.
    pub fn update(&mut self, old_pos: &Position, new_pos: Position, id: Uuid) {
        self.delete(old_pos, id);
        self.insert(new_pos, id);
    }

    pub fn find_exact(&self, pos: &Position) -> Vec<Uuid> {
        let rect = Rectangle::from_position(pos, 0.0);
        query::range_query(&self.arena, self.root, &rect, None).0
    }

    pub fn range_query(&self, rect: &Rectangle, cancel: Option<&CancellationToken>) -> (Vec<Uuid>, bool) {
        query::range_query(&self.arena, self.root, rect, cancel)
    }

    pub fn nearest_neighbors(&self, point: &Position, k: usize, cancel: Option<&CancellationToken>) -> (Vec<(f64, Uuid)>, bool) {
        query::nearest_neighbors(&self.arena, self.root, point, k, self.weights, cancel)
    }

    fn condense_tree(&mut self, key: NodeKey) {
        let mut reinsert_list: Vec<(usize, Entry)> = Vec::new();
        let mut current = key;
        loop {
            let parent = self.arena.get(current).parent;
            match parent {
                None => break,
                Some(parent_key) => {
                    let entries_len = self.arena.get(current).entries.len();
                    if entries_len < self.min_entries {
                        let node = self.arena.remove(current);
                        for e in node.entries {
                            reinsert_list.push((node.level, e));
                        }
                        self.arena.get_mut(parent_key).entries.retain(|e| !matches!(e.pointer, Pointer::Child(k) if k == current));
                        current = parent_key;
                    } else {
                        let rect = self.arena.get(current).bounding_rect();
                        if let Some(idx) = self.arena.entry_index_for_child(parent_key, current) {
                            self.arena.get_mut(parent_key).entries[idx].mbr = rect;
                        }
                        current = parent_key;
                    }
                }
            }
        }
        self.collapse_root();
        for (level, entry) in reinsert_list {
            self.reinsert_entry(level, entry);
        }
    }

    fn collapse_root(&mut self) {
        loop {
            let root_node = self.arena.get(self.root);
            if root_node.is_leaf() || root_node.entries.len() != 1 {
                break;
            }
            let only_child = match root_node.entries[0].pointer {
                Pointer::Child(c) => c,
                Pointer::Leaf(_) => break,
            };
            self.arena.remove(self.root);
            self.arena.get_mut(only_child).parent = None;
            self.root = only_child;
        }
    }

    /// Reinserts an entry collected by `condense_tree`. The point(s) it
    /// carries are still present in `self.len` from their original insert,
    /// so each is uncounted just before the `insert` call that recounts it.
    fn reinsert_entry(&mut self, level: usize, entry: Entry) {
        match entry.pointer {
            Pointer::Leaf(id) => {
                let pos = Position { t: entry.mbr.min_t, r: entry.mbr.min_r, theta: entry.mbr.min_theta };
                self.len -= 1;
                self.insert(pos, id);
            }
            Pointer::Child(child_key) => {
                let _ = level;
                for (pos, id) in self.take_leaf_positions(child_key) {
                    self.len -= 1;
                    self.insert(pos, id);
                }
            }
        }
    }

    /// Removes `key` and its whole subtree from the arena, returning every
    /// leaf `(position, id)` it contained, so callers can reinsert them
    /// from the top as plain points.
    fn take_leaf_positions(&mut self, key: NodeKey) -> Vec<(Position, Uuid)> {
        let node = self.arena.remove(key);
        let mut out = Vec::new();
        for entry in node.entries {
            match entry.pointer {
                Pointer::Leaf(id) => {
                    self.id_index.remove(&id);
                    let pos = Position { t: entry.mbr.min_t, r: entry.mbr.min_r, theta: entry.mbr.min_theta };
                    out.push((pos, id));
                }
                Pointer::Child(child_key) => {
                    out.extend(self.take_leaf_positions(child_key));
                }
            }
        }
        out
    }
}

impl Default for RTree {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_MIN_ENTRIES)
    }
}

#[cfg(test)]
#[path = "spatial_tests.rs"]
mod spatial_tests;
