//! Persistence for delta records (spec §4.6): keeps `CF_DELTAS` as the
//! source of truth plus three secondary indices for node/time/head lookups.

use super::record::DeltaRecord;
use crate::codec::{self, CodecKind};
use crate::error::{MeridianError, MeridianResult};
use crate::kv::{keys, BatchOp, KvBackend, CF_DELTAS, CF_DELTA_BY_NODE, CF_DELTA_LATEST, CF_DELTA_TIME};
use std::sync::Arc;
use uuid::Uuid;

pub struct DeltaStore {
    backend: Arc<KvBackend>,
    codec: CodecKind,
}

impl DeltaStore {
    pub fn new(backend: Arc<KvBackend>, codec: CodecKind) -> Self {
        Self { backend, codec }
    }

    fn node_index(&self, node_id: Uuid) -> MeridianResult<Vec<Uuid>> {
        match self.backend.get(CF_DELTA_BY_NODE, &keys::delta_by_node_key(node_id))? {
            Some(bytes) => bincode::deserialize(&bytes).map_err(MeridianError::from),
            None => Ok(Vec::new()),
        }
    }

    pub fn append(&self, record: &DeltaRecord) -> MeridianResult<()> {
        if record.is_empty() {
            return Err(MeridianError::InvariantViolation("empty delta record is never stored".into()));
        }
        let mut index = self.node_index(record.node_id)?;
        index.push(record.delta_id);
        let index_bytes = bincode::serialize(&index)?;

        let payload = codec::encode(self.codec, record)?;
        let ops = vec![
            BatchOp::Put { cf: CF_DELTAS, key: keys::delta_key(record.delta_id), value: payload },
            BatchOp::Put {
                cf: CF_DELTA_TIME,
                key: keys::delta_time_key(record.node_id, record.timestamp),
                value: record.delta_id.as_bytes().to_vec(),
            },
            BatchOp::Put {
                cf: CF_DELTA_LATEST,
                key: keys::delta_latest_key(record.node_id),
                value: record.delta_id.as_bytes().to_vec(),
            },
            BatchOp::Put { cf: CF_DELTA_BY_NODE, key: keys::delta_by_node_key(record.node_id), value: index_bytes },
        ];
        self.backend.write_batch(ops)
    }

    pub fn get(&self, delta_id: Uuid) -> MeridianResult<Option<DeltaRecord>> {
        match self.backend.get(CF_DELTAS, &keys::delta_key(delta_id))? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every record for `node_id`, sorted by `(timestamp, delta_id)`.
    pub fn for_node(&self, node_id: Uuid) -> MeridianResult<Vec<DeltaRecord>> {
        let ids = self.node_index(node_id)?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get(id)? {
                out.push(record);
            }
        }
        out.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp).then(a.delta_id.cmp(&b.delta_id)));
        Ok(out)
    }

    pub fn range(&self, node_id: Uuid, t_lo: f64, t_hi: f64) -> MeridianResult<Vec<DeltaRecord>> {
        let (lo, hi) = keys::delta_time_range_bounds(node_id, t_lo, t_hi);
        let pairs = self.backend.range_scan(CF_DELTA_TIME, &lo, &hi)?;
        let mut out = Vec::with_capacity(pairs.len());
        for (_, v) in pairs {
            let id = uuid_from_value(&v)?;
            if let Some(record) = self.get(id)? {
                out.push(record);
            }
        }
        out.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Ok(out)
    }

    pub fn latest(&self, node_id: Uuid) -> MeridianResult<Option<DeltaRecord>> {
        match self.backend.get(CF_DELTA_LATEST, &keys::delta_latest_key(node_id))? {
            Some(v) => self.get(uuid_from_value(&v)?),
            None => Ok(None),
        }
    }

    pub fn set_latest(&self, node_id: Uuid, delta_id: Option<Uuid>) -> MeridianResult<()> {
        match delta_id {
            Some(id) => self.backend.put(CF_DELTA_LATEST, &keys::delta_latest_key(node_id), id.as_bytes()),
            None => self.backend.delete(CF_DELTA_LATEST, &keys::delta_latest_key(node_id)).map(|_| ()),
        }
    }

    /// Removes a single record and its secondary index entries (used by
    /// compaction/pruning to flush the in-memory chain's deletions).
    pub fn delete(&self, delta_id: Uuid) -> MeridianResult<bool> {
        let Some(record) = self.get(delta_id)? else { return Ok(false) };
        let mut index = self.node_index(record.node_id)?;
        index.retain(|id| *id != delta_id);
        let index_bytes = bincode::serialize(&index)?;

        let ops = vec![
            BatchOp::Delete { cf: CF_DELTAS, key: keys::delta_key(delta_id) },
            BatchOp::Delete { cf: CF_DELTA_TIME, key: keys::delta_time_key(record.node_id, record.timestamp) },
            BatchOp::Put { cf: CF_DELTA_BY_NODE, key: keys::delta_by_node_key(record.node_id), value: index_bytes },
        ];
        self.backend.write_batch(ops)?;
        Ok(true)
    }
}

fn uuid_from_value(bytes: &[u8]) -> MeridianResult<Uuid> {
    Uuid::from_slice(bytes).map_err(|e| MeridianError::Serialization(e.to_string()))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
