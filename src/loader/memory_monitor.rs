//! Process memory monitor: samples resident set size and fires
//! warning/critical callbacks when configured thresholds are crossed.
//!
//! Grounded on the memory-pressure hooks referenced by
//! `original_source/src/storage/partial_loader.py` (the partial loader's
//! "fatal over-pressure" fallback) together with the teacher's background
//! polling pattern used elsewhere in this module.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use sysinfo::{Pid, System};

type Callback = Box<dyn Fn(u64) + Send + Sync>;

struct Callbacks {
    warning: Option<Callback>,
    critical: Option<Callback>,
}

pub struct MemoryMonitor {
    warning_bytes: u64,
    critical_bytes: u64,
    last_rss: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
    callbacks: Arc<Mutex<Callbacks>>,
}

impl MemoryMonitor {
    pub fn new(warning_bytes: u64, critical_bytes: u64, poll_interval_ms: u64) -> Arc<Self> {
        let monitor = Arc::new(Self {
            warning_bytes,
            critical_bytes,
            last_rss: Arc::new(AtomicU64::new(0)),
            stop: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
            callbacks: Arc::new(Mutex::new(Callbacks { warning: None, critical: None })),
        });
        monitor.start(poll_interval_ms);
        monitor
    }

    pub fn on_warning(&self, callback: impl Fn(u64) + Send + Sync + 'static) {
        self.callbacks.lock().warning = Some(Box::new(callback));
    }

    pub fn on_critical(&self, callback: impl Fn(u64) + Send + Sync + 'static) {
        self.callbacks.lock().critical = Some(Box::new(callback));
    }

    pub fn current_rss(&self) -> u64 {
        self.last_rss.load(Ordering::Relaxed)
    }

    fn start(self: &Arc<Self>, poll_interval_ms: u64) {
        let stop = self.stop.clone();
        let last_rss = self.last_rss.clone();
        let callbacks = self.callbacks.clone();
        let warning_bytes = self.warning_bytes;
        let critical_bytes = self.critical_bytes;
        let pid = Pid::from_u32(std::process::id());

        let handle = std::thread::Builder::new()
            .name("memory-monitor".into())
            .spawn(move || {
                let mut system = System::new();
                let mut was_warning = false;
                let mut was_critical = false;
                while !stop.load(Ordering::Relaxed) {
                    system.refresh_process(pid);
                    if let Some(process) = system.process(pid) {
                        let rss = process.memory();
                        last_rss.store(rss, Ordering::Relaxed);

                        if rss >= critical_bytes {
                            if !was_critical {
                                tracing::error!(target: "meridian::loader", rss, "memory usage entered critical range");
                            }
                            was_critical = true;
                            if let Some(cb) = callbacks.lock().critical.as_ref() {
                                cb(rss);
                            }
                        } else {
                            was_critical = false;
                        }

                        if rss >= warning_bytes && rss < critical_bytes {
                            if !was_warning {
                                tracing::warn!(target: "meridian::loader", rss, "memory usage entered warning range");
                            }
                            was_warning = true;
                            if let Some(cb) = callbacks.lock().warning.as_ref() {
                                cb(rss);
                            }
                        } else if rss < warning_bytes {
                            was_warning = false;
                        }
                    }
                    std::thread::sleep(std::time::Duration::from_millis(poll_interval_ms));
                }
            })
            .expect("spawning memory monitor thread");
        *self.thread.lock() = Some(handle);
    }

    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MemoryMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
