//! Embedded column-family key-value backend. One physical `rocksdb`
//! instance hosts every index described in spec §6 as an independent
//! column family.

pub mod keys;

use crate::error::{retry_storage_io, MeridianError, MeridianResult};
use parking_lot::Mutex;
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::collections::VecDeque;
use std::path::Path;

pub const CF_NODES: &str = "nodes";
pub const CF_META: &str = "meta";
pub const CF_TEMPORAL: &str = "t_idx";
pub const CF_SPATIAL: &str = "s_idx";
pub const CF_DELTAS: &str = "deltas";
pub const CF_DELTA_BY_NODE: &str = "delta_by_node";
pub const CF_DELTA_TIME: &str = "delta_time";
pub const CF_DELTA_LATEST: &str = "delta_latest";

const ALL_COLUMN_FAMILIES: &[&str] = &[
    CF_NODES,
    CF_META,
    CF_TEMPORAL,
    CF_SPATIAL,
    CF_DELTAS,
    CF_DELTA_BY_NODE,
    CF_DELTA_TIME,
    CF_DELTA_LATEST,
];

/// A single write in an atomic batch.
pub enum BatchOp {
    Put { cf: &'static str, key: Vec<u8>, value: Vec<u8> },
    Delete { cf: &'static str, key: Vec<u8> },
}

/// Rolling error-rate counter, observational only.
///
/// Grounded on the original implementation's `ErrorTracker`: it never
/// opens a circuit or rejects calls, it only logs once the error rate
/// crosses a threshold so operators notice before callers do.
struct ErrorTracker {
    window: VecDeque<bool>,
    capacity: usize,
    alert_threshold: f64,
    alerted: bool,
}

impl ErrorTracker {
    fn new(capacity: usize, alert_threshold: f64) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            alert_threshold,
            alerted: false,
        }
    }

    fn record(&mut self, ok: bool) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(ok);
        let rate = self.error_rate();
        if rate > self.alert_threshold && !self.alerted {
            tracing::warn!(target: "meridian::kv", error_rate = rate, "storage error rate crossed alert threshold");
            self.alerted = true;
        } else if rate <= self.alert_threshold {
            self.alerted = false;
        }
    }

    fn error_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let errors = self.window.iter().filter(|ok| !**ok).count();
        errors as f64 / self.window.len() as f64
    }
}

pub struct KvBackend {
    db: DB,
    error_tracker: Mutex<ErrorTracker>,
}

impl KvBackend {
    pub fn open(path: impl AsRef<Path>) -> MeridianResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        let cfs: Vec<ColumnFamilyDescriptor> = ALL_COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        tracing::debug!(target: "meridian::kv", "opened backend with {} column families", ALL_COLUMN_FAMILIES.len());
        Ok(Self {
            db,
            error_tracker: Mutex::new(ErrorTracker::new(200, 0.5)),
        })
    }

    fn cf(&self, name: &str) -> MeridianResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| MeridianError::StorageIO(format!("unknown column family: {name}")))
    }

    fn track<T>(&self, result: MeridianResult<T>) -> MeridianResult<T> {
        self.error_tracker.lock().record(result.is_ok());
        result
    }

    pub fn put(&self, cf: &str, key: &[u8], value: &[u8]) -> MeridianResult<()> {
        let result = retry_storage_io(3, || {
            let handle = self.cf(cf)?;
            self.db.put_cf(handle, key, value).map_err(MeridianError::from)
        });
        self.track(result)
    }

    pub fn get(&self, cf: &str, key: &[u8]) -> MeridianResult<Option<Vec<u8>>> {
        let result = retry_storage_io(3, || {
            let handle = self.cf(cf)?;
            self.db.get_cf(handle, key).map_err(MeridianError::from)
        });
        self.track(result)
    }

    /// Returns whether the key existed before the delete.
    pub fn delete(&self, cf: &str, key: &[u8]) -> MeridianResult<bool> {
        let existed = self.get(cf, key)?.is_some();
        let result = retry_storage_io(3, || {
            let handle = self.cf(cf)?;
            self.db.delete_cf(handle, key).map_err(MeridianError::from)
        });
        self.track(result)?;
        Ok(existed)
    }

    pub fn prefix_scan(&self, cf: &str, prefix: &[u8]) -> MeridianResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let handle = self.cf(cf)?;
        let mut out = Vec::new();
        let iter = self.db.prefix_iterator_cf(handle, prefix);
        for item in iter {
            let (k, v) = item.map_err(MeridianError::from)?;
            if !k.starts_with(prefix) {
                break;
            }
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    pub fn range_scan(&self, cf: &str, lo: &[u8], hi: &[u8]) -> MeridianResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let handle = self.cf(cf)?;
        let mut out = Vec::new();
        let iter = self
            .db
            .iterator_cf(handle, IteratorMode::From(lo, rocksdb::Direction::Forward));
        for item in iter {
            let (k, v) = item.map_err(MeridianError::from)?;
            if k.as_ref() > hi {
                break;
            }
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    /// Apply every op atomically. Either all land or none do.
    pub fn write_batch(&self, ops: Vec<BatchOp>) -> MeridianResult<()> {
        let mut batch = WriteBatch::default();
        for op in &ops {
            match op {
                BatchOp::Put { cf, key, value } => {
                    let handle = self.cf(cf)?;
                    batch.put_cf(handle, key, value);
                }
                BatchOp::Delete { cf, key } => {
                    let handle = self.cf(cf)?;
                    batch.delete_cf(handle, key);
                }
            }
        }
        let result = self.db.write(batch).map_err(MeridianError::from);
        self.track(result)
    }

    pub fn error_rate(&self) -> f64 {
        self.error_tracker.lock().error_rate()
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod kv_tests;
