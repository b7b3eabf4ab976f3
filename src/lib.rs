pub mod cache;
pub mod cancel;
pub mod codec;
pub mod config;
pub mod coord;
pub mod delta;
pub mod error;
pub mod kv;
pub mod loader;
pub mod node;
pub mod reconstruct;
pub mod spatial;
pub mod store;
pub mod temporal;

/// Initializes a `tracing` subscriber for test output. Library code never
/// calls this; only test modules that want to see `debug!`/`warn!` output
/// under `cargo test -- --nocapture` do.
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

// Test-only printing helper: expands to tprintln! during tests and is absent otherwise.
// Usage in tests: tprintln!("debug: {}", value);
#[cfg(test)]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}

// In non-test builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(test))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => {
        if false { let _ = format!($($arg)*); }
    };
}
