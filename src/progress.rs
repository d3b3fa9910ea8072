// src/progress.rs

//! Progress reporting seam between the operation engine and any UI
//!
//! Operations report package-level events through [`ProgressSink`];
//! what becomes of them is the caller's business. The CLI binds an
//! indicatif implementation, tests and scripted use bind
//! [`SilentProgress`], and non-interactive environments can bind
//! [`LogProgress`] to keep progress in the logs.
//!
//! Implementations must be thread-safe: the fetch phase reports from a
//! worker pool.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// Package-level progress events emitted by operations.
pub trait ProgressSink: Send + Sync {
    /// An operation over `total` packages is starting.
    fn begin(&self, operation: &str, total: usize);

    /// Work on one package has started.
    fn package_started(&self, import_path: &str);

    /// Work on one package has finished. `detail` is a short human
    /// description of the outcome.
    fn package_finished(&self, import_path: &str, success: bool, detail: &str);

    /// The whole operation is done.
    fn finish(&self, summary: &str);
}

/// No-op sink that still counts events, for scripted use and tests.
#[derive(Debug, Default)]
pub struct SilentProgress {
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl SilentProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

impl ProgressSink for SilentProgress {
    fn begin(&self, _operation: &str, _total: usize) {}

    fn package_started(&self, _import_path: &str) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    fn package_finished(&self, _import_path: &str, success: bool, _detail: &str) {
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn finish(&self, _summary: &str) {}
}

/// Sink that writes events to tracing at info/warn level.
#[derive(Debug, Default)]
pub struct LogProgress;

impl LogProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressSink for LogProgress {
    fn begin(&self, operation: &str, total: usize) {
        info!("{} ({} packages)", operation, total);
    }

    fn package_started(&self, import_path: &str) {
        info!("{}: started", import_path);
    }

    fn package_finished(&self, import_path: &str, success: bool, detail: &str) {
        if success {
            info!("{}: {}", import_path, detail);
        } else {
            warn!("{}: {}", import_path, detail);
        }
    }

    fn finish(&self, summary: &str) {
        info!("{}", summary);
    }
}
