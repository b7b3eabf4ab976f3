//! Delta records (spec §3, §4.6): one entry in a node's reversible history.

use super::ops::DeltaOp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeltaRecord {
    pub delta_id: Uuid,
    pub node_id: Uuid,
    pub timestamp: f64,
    pub operations: Vec<DeltaOp>,
    pub previous_delta_id: Option<Uuid>,
    pub metadata: Map<String, Value>,
}

impl DeltaRecord {
    pub fn new(node_id: Uuid, timestamp: f64, operations: Vec<DeltaOp>, previous_delta_id: Option<Uuid>) -> Self {
        Self { delta_id: Uuid::new_v4(), node_id, timestamp, operations, previous_delta_id, metadata: Map::new() }
    }

    pub fn checkpoint(node_id: Uuid, timestamp: f64, content: Value, previous_delta_id: Option<Uuid>) -> Self {
        let mut metadata = Map::new();
        metadata.insert("checkpoint".into(), Value::Bool(true));
        metadata.insert("content".into(), content);
        Self { delta_id: Uuid::new_v4(), node_id, timestamp, operations: Vec::new(), previous_delta_id, metadata }
    }

    /// An empty record (no operations, not a checkpoint) carries no information
    /// and must never be persisted.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && !self.is_checkpoint()
    }

    pub fn is_checkpoint(&self) -> bool {
        matches!(self.metadata.get("checkpoint"), Some(Value::Bool(true)))
    }

    pub fn checkpoint_content(&self) -> Option<&Value> {
        if self.is_checkpoint() {
            self.metadata.get("content")
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
