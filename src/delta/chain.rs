//! Per-node delta chain (spec §4.6): append-only history rooted at an origin,
//! with checkpoints, compaction and pruning.

use super::record::DeltaRecord;
use crate::error::{MeridianError, MeridianResult};
use crate::temporal::TimeKey;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

pub struct DeltaChain {
    pub node_id: Uuid,
    pub origin_content: Value,
    pub origin_timestamp: f64,
    records: HashMap<Uuid, DeltaRecord>,
    time_sorted: Vec<Uuid>,
    next_of: HashMap<Uuid, Uuid>,
    checkpoints: BTreeMap<TimeKey, Value>,
    head: Option<Uuid>,
}

impl DeltaChain {
    pub fn new(node_id: Uuid, origin_content: Value, origin_timestamp: f64) -> Self {
        Self {
            node_id,
            origin_content,
            origin_timestamp,
            records: HashMap::new(),
            time_sorted: Vec::new(),
            next_of: HashMap::new(),
            checkpoints: BTreeMap::new(),
            head: None,
        }
    }

    pub fn head(&self) -> Option<Uuid> {
        self.head
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn sort_key(&self, id: Uuid) -> (f64, Uuid) {
        (self.records[&id].timestamp, id)
    }

    fn insert_sorted(&mut self, id: Uuid) {
        let key = self.sort_key(id);
        let pos = self
            .time_sorted
            .partition_point(|existing| self.sort_key(*existing) < key);
        self.time_sorted.insert(pos, id);
    }

    pub fn append(&mut self, record: DeltaRecord) -> MeridianResult<Uuid> {
        if record.is_empty() {
            return Err(MeridianError::InvariantViolation("empty delta record is never stored".into()));
        }
        if record.node_id != self.node_id {
            return Err(MeridianError::InvariantViolation("delta record node_id does not match chain".into()));
        }
        if record.previous_delta_id != self.head {
            return Err(MeridianError::InvariantViolation(
                "delta record previous_delta_id does not point to the current head".into(),
            ));
        }

        let delta_id = record.delta_id;
        if let Some(prev) = record.previous_delta_id {
            self.next_of.insert(prev, delta_id);
        }
        self.records.insert(delta_id, record);
        self.insert_sorted(delta_id);
        self.head = Some(delta_id);
        Ok(delta_id)
    }

    pub fn get(&self, delta_id: Uuid) -> Option<&DeltaRecord> {
        self.records.get(&delta_id)
    }

    /// Latest checkpoint with timestamp `<= t`, if any.
    fn checkpoint_base(&self, t: f64) -> Option<(f64, &Value)> {
        self.checkpoints
            .range(..=TimeKey(t))
            .next_back()
            .map(|(k, v)| (k.0, v))
    }

    /// Records with `base_t < timestamp <= target_t`, in time order.
    fn records_in(&self, base_t: f64, target_t: f64) -> Vec<&DeltaRecord> {
        self.time_sorted
            .iter()
            .map(|id| &self.records[id])
            .filter(|r| r.timestamp > base_t && r.timestamp <= target_t)
            .collect()
    }

    pub fn reconstruct_at(&self, target_t: f64) -> MeridianResult<Value> {
        if target_t <= self.origin_timestamp {
            return Ok(self.origin_content.clone());
        }
        let (base_t, mut content) = match self.checkpoint_base(target_t) {
            Some((t, snapshot)) => (t, snapshot.clone()),
            None => (self.origin_timestamp, self.origin_content.clone()),
        };
        for record in self.records_in(base_t, target_t) {
            for op in &record.operations {
                content = op.apply(&content)?;
            }
        }
        Ok(content)
    }

    pub fn create_checkpoint(&mut self, t: f64) -> MeridianResult<()> {
        if t < self.origin_timestamp {
            return Err(MeridianError::InvariantViolation("checkpoint before origin timestamp".into()));
        }
        let content = self.reconstruct_at(t)?;
        self.checkpoints.insert(TimeKey(t), content);
        Ok(())
    }

    pub fn checkpoint_content(&self, t: f64) -> Option<&Value> {
        self.checkpoints.get(&TimeKey(t))
    }

    /// Registers an already-materialized checkpoint (e.g. loaded from
    /// storage) without recomputing it via `reconstruct_at`.
    pub fn install_checkpoint(&mut self, t: f64, content: Value) {
        self.checkpoints.insert(TimeKey(t), content);
    }

    /// Merges adjacent records whose combined operation count is `<= max_ops`.
    /// Checkpoint records (always empty-ops) are never eligible to merge.
    pub fn compact(&mut self, max_ops: usize) {
        let mut i = 0;
        while i + 1 < self.time_sorted.len() {
            let a_id = self.time_sorted[i];
            let b_id = self.time_sorted[i + 1];
            let a = &self.records[&a_id];
            let b = &self.records[&b_id];
            if a.is_checkpoint() || b.is_checkpoint() {
                i += 1;
                continue;
            }
            if a.operations.len() + b.operations.len() > max_ops {
                i += 1;
                continue;
            }

            let mut merged_ops = a.operations.clone();
            merged_ops.extend(b.operations.clone());
            let merged = DeltaRecord {
                delta_id: a_id,
                node_id: self.node_id,
                timestamp: b.timestamp,
                operations: merged_ops,
                previous_delta_id: a.previous_delta_id,
                metadata: a.metadata.clone(),
            };

            self.records.remove(&b_id);
            self.records.insert(a_id, merged);
            self.time_sorted.remove(i + 1);
            self.next_of.remove(&a_id);
            if let Some(next_of_b) = self.next_of.remove(&b_id) {
                self.next_of.insert(a_id, next_of_b);
                if let Some(next_record) = self.records.get_mut(&next_of_b) {
                    next_record.previous_delta_id = Some(a_id);
                }
            }
            if self.head == Some(b_id) {
                self.head = Some(a_id);
            }
            // retry merging the newly-combined record against its new neighbour
        }
    }

    pub fn prune(&mut self, cutoff: f64) -> MeridianResult<()> {
        if cutoff <= self.origin_timestamp {
            return Err(MeridianError::InvariantViolation("prune cutoff must exceed origin timestamp".into()));
        }
        self.create_checkpoint(cutoff)?;
        let snapshot = self.checkpoints.get(&TimeKey(cutoff)).cloned().unwrap();

        let (kept, dropped): (Vec<Uuid>, Vec<Uuid>) =
            self.time_sorted.iter().copied().partition(|id| self.records[id].timestamp > cutoff);
        for id in &dropped {
            self.records.remove(id);
            self.next_of.remove(id);
        }
        self.time_sorted = kept;
        if let Some(first_kept) = self.time_sorted.first() {
            if let Some(record) = self.records.get_mut(first_kept) {
                record.previous_delta_id = None;
            }
        } else {
            self.head = None;
        }

        self.origin_content = snapshot;
        self.origin_timestamp = cutoff;
        self.checkpoints.retain(|k, _| k.0 >= cutoff);
        Ok(())
    }

    pub fn iter_in_time_order(&self) -> impl Iterator<Item = &DeltaRecord> {
        self.time_sorted.iter().map(move |id| &self.records[id])
    }
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod chain_tests;
