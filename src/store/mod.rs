//! Typed node store layered over the key-value backend (C5).

pub mod txn;

use crate::codec::{self, CodecKind};
use crate::error::{MeridianError, MeridianResult};
use crate::kv::{keys, BatchOp, KvBackend, CF_NODES};
use crate::node::Node;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub use txn::Transaction;

pub struct NodeStore {
    pub(crate) backend: Arc<KvBackend>,
    pub(crate) codec: CodecKind,
}

impl NodeStore {
    pub fn new(backend: Arc<KvBackend>, codec: CodecKind) -> Self {
        Self { backend, codec }
    }

    pub fn put(&self, node: &Node) -> MeridianResult<()> {
        let bytes = codec::encode(self.codec, node)?;
        tracing::debug!(target: "meridian::store", id = %node.id, "put node");
        self.backend.put(CF_NODES, &keys::node_key(node.id), &bytes)
    }

    pub fn get(&self, id: Uuid) -> MeridianResult<Option<Node>> {
        match self.backend.get(CF_NODES, &keys::node_key(id))? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn delete(&self, id: Uuid) -> MeridianResult<bool> {
        tracing::debug!(target: "meridian::store", %id, "delete node");
        self.backend.delete(CF_NODES, &keys::node_key(id))
    }

    pub fn exists(&self, id: Uuid) -> MeridianResult<bool> {
        Ok(self.backend.get(CF_NODES, &keys::node_key(id))?.is_some())
    }

    /// O(N) scan over every stored node. Documented as such by spec §4.2.
    pub fn count(&self) -> MeridianResult<usize> {
        Ok(self.backend.prefix_scan(CF_NODES, b"n")?.len())
    }

    /// O(N) scan over every stored node id.
    pub fn list_ids(&self) -> MeridianResult<Vec<Uuid>> {
        self.backend
            .prefix_scan(CF_NODES, b"n")?
            .into_iter()
            .map(|(k, _)| {
                keys::uuid_from_suffix(&k)
                    .ok_or_else(|| MeridianError::StorageIO("malformed node key".into()))
            })
            .collect()
    }

    /// Single atomic batch write. Ordering within the batch is not observable.
    pub fn batch_put(&self, nodes: &[Node]) -> MeridianResult<()> {
        let mut ops = Vec::with_capacity(nodes.len());
        for node in nodes {
            let bytes = codec::encode(self.codec, node)?;
            ops.push(BatchOp::Put {
                cf: CF_NODES,
                key: keys::node_key(node.id),
                value: bytes,
            });
        }
        self.backend.write_batch(ops)
    }

    pub fn batch_get(&self, ids: &[Uuid]) -> MeridianResult<HashMap<Uuid, Node>> {
        let mut out = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(node) = self.get(*id)? {
                out.insert(*id, node);
            }
        }
        Ok(out)
    }

    pub fn begin_transaction(&self) -> Transaction {
        Transaction::new(Arc::clone(&self.backend), self.codec)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
