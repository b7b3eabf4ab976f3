//! Node and connection types stored at each cylindrical position.
//!
//! Grounded on `original_source/src/storage/key_management.py` (ID
//! generation conventions) and the node shape implied throughout
//! `original_source/src/core` and `src/delta`.

use crate::coord::Position;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A directed edge from one node to another, carrying a typed relation
/// and a strength in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub target_id: Uuid,
    pub connection_type: String,
    pub strength: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Connection {
    pub fn new(target_id: Uuid, connection_type: impl Into<String>, strength: f64) -> Self {
        Self {
            target_id,
            connection_type: connection_type.into(),
            strength: strength.clamp(0.0, 1.0),
            metadata: Map::new(),
        }
    }
}

/// A single record in the store: a position, a JSON content tree, its
/// outgoing connections, and bookkeeping linking it into delta history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: Uuid,
    pub position: Position,
    pub content: Value,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// If this node was derived from another (e.g. a branch or clone),
    /// the node it originated from.
    #[serde(default)]
    pub origin_reference: Option<Uuid>,
    #[serde(default)]
    pub delta_information: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Node {
    pub fn new(position: Position, content: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content,
            connections: Vec::new(),
            origin_reference: None,
            delta_information: Map::new(),
            metadata: Map::new(),
        }
    }

    pub fn with_id(id: Uuid, position: Position, content: Value) -> Self {
        Self {
            id,
            position,
            content,
            connections: Vec::new(),
            origin_reference: None,
            delta_information: Map::new(),
            metadata: Map::new(),
        }
    }

    /// Deterministic id derived from a namespace and stable name, so the
    /// same logical entity always maps to the same node id across runs.
    pub fn deterministic_id(namespace: Uuid, name: &str) -> Uuid {
        Uuid::new_v5(&namespace, name.as_bytes())
    }

    pub fn add_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    pub fn remove_connection(&mut self, target_id: Uuid) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c.target_id != target_id);
        self.connections.len() != before
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod node_tests;
