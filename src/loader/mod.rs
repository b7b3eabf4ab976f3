//! Partial loading and residency control (C11, spec §4.8).
//!
//! Grounded on `PartialLoader` in `original_source/src/storage/partial_loader.py`:
//! a bounded in-memory node set with pinning, reference counting, and a
//! background GC thread that evicts the oldest unreferenced entries.

pub mod memory_monitor;
pub mod streaming;

pub use memory_monitor::MemoryMonitor;
pub use streaming::StreamingQueryResult;

use crate::error::MeridianResult;
use crate::node::Node;
use crate::store::NodeStore;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use uuid::Uuid;

const MAX_RECENT_WINDOWS: usize = 5;
const MAX_RECENT_REGIONS: usize = 5;
const PREFETCH_BATCH_LIMIT: usize = 50;

struct Inner {
    loaded_nodes: HashMap<Uuid, Node>,
    access_times: HashMap<Uuid, u64>,
    access_counter: u64,
    pinned: HashSet<Uuid>,
    ref_counts: HashMap<Uuid, u64>,
    recent_windows: VecDeque<(f64, f64)>,
    recent_regions: VecDeque<(f64, f64, f64, f64)>,
}

pub struct PartialLoader {
    store: Arc<NodeStore>,
    max_nodes_in_memory: usize,
    inner: Mutex<Inner>,
    stop: Arc<AtomicBool>,
    gc_thread: Mutex<Option<JoinHandle<()>>>,
}

impl PartialLoader {
    pub fn new(store: Arc<NodeStore>, max_nodes_in_memory: usize, gc_interval_ms: u64) -> Arc<Self> {
        let loader = Arc::new(Self {
            store,
            max_nodes_in_memory: max_nodes_in_memory.max(1),
            inner: Mutex::new(Inner {
                loaded_nodes: HashMap::new(),
                access_times: HashMap::new(),
                access_counter: 0,
                pinned: HashSet::new(),
                ref_counts: HashMap::new(),
                recent_windows: VecDeque::new(),
                recent_regions: VecDeque::new(),
            }),
            stop: Arc::new(AtomicBool::new(false)),
            gc_thread: Mutex::new(None),
        });
        loader.start_gc_thread(gc_interval_ms);
        loader
    }

    fn start_gc_thread(self: &Arc<Self>, gc_interval_ms: u64) {
        let weak = Arc::downgrade(self);
        let stop = self.stop.clone();
        let handle = std::thread::Builder::new()
            .name("partial-loader-gc".into())
            .spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    std::thread::sleep(std::time::Duration::from_millis(gc_interval_ms));
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    if let Some(loader) = weak.upgrade() {
                        loader.run_gc();
                    } else {
                        break;
                    }
                }
            })
            .expect("spawning partial loader GC thread");
        *self.gc_thread.lock() = Some(handle);
    }

    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.gc_thread.lock().take() {
            let _ = handle.join();
        }
    }

    fn run_gc(&self) {
        let mut inner = self.inner.lock();
        if inner.loaded_nodes.len() <= self.max_nodes_in_memory {
            return;
        }
        let to_evict = inner.loaded_nodes.len() - self.max_nodes_in_memory;
        let mut candidates: Vec<(Uuid, u64)> = inner
            .loaded_nodes
            .keys()
            .filter(|id| !inner.pinned.contains(*id) && inner.ref_counts.get(*id).copied().unwrap_or(0) == 0)
            .map(|id| (*id, inner.access_times.get(id).copied().unwrap_or(0)))
            .collect();
        candidates.sort_by_key(|(_, t)| *t);

        let mut evicted = 0;
        for (id, _) in candidates {
            if evicted >= to_evict {
                break;
            }
            inner.loaded_nodes.remove(&id);
            inner.access_times.remove(&id);
            inner.ref_counts.remove(&id);
            evicted += 1;
        }
        tracing::debug!(target: "meridian::loader", evicted, "partial loader GC cycle");
    }

    pub fn get(&self, id: Uuid) -> MeridianResult<Option<Node>> {
        {
            let mut inner = self.inner.lock();
            inner.access_counter += 1;
            let counter = inner.access_counter;
            if let Some(node) = inner.loaded_nodes.get(&id) {
                let node = node.clone();
                inner.access_times.insert(id, counter);
                return Ok(Some(node));
            }
        }

        let Some(node) = self.store.get(id)? else { return Ok(None) };
        {
            let mut inner = self.inner.lock();
            inner.access_counter += 1;
            let counter = inner.access_counter;
            inner.loaded_nodes.insert(id, node.clone());
            inner.access_times.insert(id, counter);
        }
        if self.inner.lock().loaded_nodes.len() > self.max_nodes_in_memory {
            self.run_gc();
        }
        Ok(Some(node))
    }

    pub fn pin(&self, id: Uuid) {
        self.inner.lock().pinned.insert(id);
    }

    pub fn unpin(&self, id: Uuid) {
        self.inner.lock().pinned.remove(&id);
    }

    pub fn begin_usage(&self, id: Uuid) {
        *self.inner.lock().ref_counts.entry(id).or_insert(0) += 1;
    }

    pub fn end_usage(&self, id: Uuid) {
        let mut inner = self.inner.lock();
        if let Some(count) = inner.ref_counts.get_mut(&id) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn resident_count(&self) -> usize {
        self.inner.lock().loaded_nodes.len()
    }

    fn track_recent_window(&self, lo: f64, hi: f64) {
        let mut inner = self.inner.lock();
        if inner.recent_windows.len() == MAX_RECENT_WINDOWS {
            inner.recent_windows.pop_front();
        }
        inner.recent_windows.push_back((lo, hi));
    }

    fn track_recent_region(&self, region: (f64, f64, f64, f64)) {
        let mut inner = self.inner.lock();
        if inner.recent_regions.len() == MAX_RECENT_REGIONS {
            inner.recent_regions.pop_front();
        }
        inner.recent_regions.push_back(region);
    }

    /// Materializes `ids` (already resolved by the spatial/temporal index
    /// layer), caching each and prefetching directly connected peers while
    /// there's headroom under `max_nodes_in_memory`.
    fn load_ids(&self, ids: &[Uuid], filter: Option<&dyn Fn(&Node) -> bool>) -> MeridianResult<Vec<Node>> {
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(node) = self.get(*id)? {
                if filter.map(|f| f(&node)).unwrap_or(true) {
                    nodes.push(node);
                }
            }
        }
        self.prefetch_related(&nodes)?;
        Ok(nodes)
    }

    fn prefetch_related(&self, nodes: &[Node]) -> MeridianResult<()> {
        let mut prefetched = 0;
        for node in nodes {
            if prefetched >= PREFETCH_BATCH_LIMIT {
                break;
            }
            if self.resident_count() >= self.max_nodes_in_memory {
                break;
            }
            for conn in &node.connections {
                if prefetched >= PREFETCH_BATCH_LIMIT || self.resident_count() >= self.max_nodes_in_memory {
                    break;
                }
                if self.get(conn.target_id)?.is_some() {
                    prefetched += 1;
                }
            }
        }
        Ok(())
    }

    pub fn load_temporal_window(
        &self,
        ids: &[Uuid],
        t_lo: f64,
        t_hi: f64,
        filter: Option<&dyn Fn(&Node) -> bool>,
    ) -> MeridianResult<Vec<Node>> {
        self.track_recent_window(t_lo, t_hi);
        self.load_ids(ids, filter)
    }

    pub fn load_spatial_region(
        &self,
        ids: &[Uuid],
        region: (f64, f64, f64, f64),
        filter: Option<&dyn Fn(&Node) -> bool>,
    ) -> MeridianResult<Vec<Node>> {
        self.track_recent_region(region);
        self.load_ids(ids, filter)
    }
}

impl Drop for PartialLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod loader_tests;
