//! Optimistic-concurrency transactions (spec §4.2).
//!
//! A transaction stages writes in an overlay and remembers, for every key
//! it reads, the value that was live the first time it read that key.
//! `commit` re-checks each such key against the backend; any mismatch
//! aborts the whole batch. This gives read-set validation without
//! depending on a borrowed, lifetime-bound database snapshot handle.

use crate::codec::{self, CodecKind};
use crate::error::{MeridianError, MeridianResult};
use crate::kv::{keys, BatchOp, KvBackend, CF_NODES};
use crate::node::Node;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
enum Write {
    Put(Vec<u8>),
    Delete,
}

pub struct Transaction {
    backend: Arc<KvBackend>,
    codec: CodecKind,
    read_set: HashMap<Vec<u8>, Option<Vec<u8>>>,
    writes: HashMap<Vec<u8>, Write>,
    closed: bool,
}

impl Transaction {
    pub(crate) fn new(backend: Arc<KvBackend>, codec: CodecKind) -> Self {
        Self {
            backend,
            codec,
            read_set: HashMap::new(),
            writes: HashMap::new(),
            closed: false,
        }
    }

    fn check_open(&self) -> MeridianResult<()> {
        if self.closed {
            Err(MeridianError::InvariantViolation("transaction-closed".into()))
        } else {
            Ok(())
        }
    }

    fn read_raw(&mut self, key: &[u8]) -> MeridianResult<Option<Vec<u8>>> {
        if let Some(write) = self.writes.get(key) {
            return Ok(match write {
                Write::Put(bytes) => Some(bytes.clone()),
                Write::Delete => None,
            });
        }
        if let Some(snapshot) = self.read_set.get(key) {
            return Ok(snapshot.clone());
        }
        let value = self.backend.get(CF_NODES, key)?;
        self.read_set.insert(key.to_vec(), value.clone());
        Ok(value)
    }

    pub fn get(&mut self, id: Uuid) -> MeridianResult<Option<Node>> {
        self.check_open()?;
        let key = keys::node_key(id);
        match self.read_raw(&key)? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put(&mut self, node: &Node) -> MeridianResult<()> {
        self.check_open()?;
        let bytes = codec::encode(self.codec, node)?;
        self.writes.insert(keys::node_key(node.id), Write::Put(bytes));
        Ok(())
    }

    pub fn delete(&mut self, id: Uuid) -> MeridianResult<()> {
        self.check_open()?;
        self.writes.insert(keys::node_key(id), Write::Delete);
        Ok(())
    }

    /// Validates the read set against the live backend, then applies the
    /// staged writes atomically. Rejects a second call with `transaction-closed`.
    pub fn commit(&mut self) -> MeridianResult<()> {
        self.check_open()?;
        for (key, snapshot_value) in &self.read_set {
            let current = self.backend.get(CF_NODES, key)?;
            if &current != snapshot_value {
                self.closed = true;
                tracing::warn!(target: "meridian::store", "transaction commit aborted: read-set conflict");
                return Err(MeridianError::Conflict(format!(
                    "concurrent write observed on key {}",
                    hex_preview(key)
                )));
            }
        }
        let ops = self
            .writes
            .drain()
            .map(|(key, write)| match write {
                Write::Put(value) => BatchOp::Put { cf: CF_NODES, key, value },
                Write::Delete => BatchOp::Delete { cf: CF_NODES, key },
            })
            .collect();
        self.backend.write_batch(ops)?;
        self.closed = true;
        Ok(())
    }

    pub fn rollback(&mut self) -> MeridianResult<()> {
        self.check_open()?;
        self.writes.clear();
        self.read_set.clear();
        self.closed = true;
        Ok(())
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    bytes.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[path = "txn_tests.rs"]
mod txn_tests;
