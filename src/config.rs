//! Environment-driven configuration, following the `CLARIUM_*` convention
//! of the original server's `main.rs`: everything has a default, env vars
//! override it, nothing is required.

use crate::codec::CodecKind;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: String,
    pub codec: CodecKind,
    pub rtree_max_entries: usize,
    pub rtree_min_entries: usize,
    pub cache_capacity: usize,
    pub max_nodes_in_memory: usize,
    pub gc_interval_ms: u64,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let db_path = std::env::var("MERIDIAN_DB_PATH").unwrap_or_else(|_| "meridian-data".to_string());
        let codec = std::env::var("MERIDIAN_CODEC")
            .map(|s| CodecKind::from_env_str(&s))
            .unwrap_or(CodecKind::Binary);
        let rtree_max_entries = std::env::var("MERIDIAN_RTREE_MAX_ENTRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50);
        let rtree_min_entries = std::env::var("MERIDIAN_RTREE_MIN_ENTRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(20);
        let cache_capacity = std::env::var("MERIDIAN_CACHE_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1000);
        let max_nodes_in_memory = std::env::var("MERIDIAN_MAX_NODES_IN_MEMORY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10_000);
        let gc_interval_ms = std::env::var("MERIDIAN_GC_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60_000);

        Self {
            db_path,
            codec,
            rtree_max_entries,
            rtree_min_entries,
            cache_capacity,
            max_nodes_in_memory,
            gc_interval_ms,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "meridian-data".to_string(),
            codec: CodecKind::Binary,
            rtree_max_entries: 50,
            rtree_min_entries: 20,
            cache_capacity: 1000,
            max_nodes_in_memory: 10_000,
            gc_interval_ms: 60_000,
        }
    }
}
