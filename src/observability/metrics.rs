//! Execution counters
//!
//! Monotonic atomic counters shared by every cursor tree that runs against
//! one `QueryContext`. Relaxed ordering: values are exact once the
//! statement's thread has finished, which is when they are read.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    cursors_opened: AtomicU64,
    rows_scanned: AtomicU64,
    scan_batches: AtomicU64,
    orphan_rows: AtomicU64,
    rows_sorted: AtomicU64,
    memory_sorts: AtomicU64,
    external_sorts: AtomicU64,
    spill_runs: AtomicU64,
    spill_bytes: AtomicU64,
    cancellations: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_cursors_opened(&self) {
        self.cursors_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rows_scanned(&self, rows: u64) {
        self.rows_scanned.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn increment_scan_batches(&self) {
        self.scan_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_orphan_rows(&self) {
        self.orphan_rows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rows_sorted(&self, rows: u64) {
        self.rows_sorted.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn increment_memory_sorts(&self) {
        self.memory_sorts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_external_sorts(&self) {
        self.external_sorts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one spilled run of `bytes` bytes
    pub fn record_spill_run(&self, bytes: u64) {
        self.spill_runs.fetch_add(1, Ordering::Relaxed);
        self.spill_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_cancellations(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn orphan_rows(&self) -> u64 {
        self.orphan_rows.load(Ordering::Relaxed)
    }

    pub fn spill_runs(&self) -> u64 {
        self.spill_runs.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cursors_opened: self.cursors_opened.load(Ordering::Relaxed),
            rows_scanned: self.rows_scanned.load(Ordering::Relaxed),
            scan_batches: self.scan_batches.load(Ordering::Relaxed),
            orphan_rows: self.orphan_rows.load(Ordering::Relaxed),
            rows_sorted: self.rows_sorted.load(Ordering::Relaxed),
            memory_sorts: self.memory_sorts.load(Ordering::Relaxed),
            external_sorts: self.external_sorts.load(Ordering::Relaxed),
            spill_runs: self.spill_runs.load(Ordering::Relaxed),
            spill_bytes: self.spill_bytes.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
        }
    }

    /// Current values as a single JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cursors_opened: u64,
    pub rows_scanned: u64,
    pub scan_batches: u64,
    pub orphan_rows: u64,
    pub rows_sorted: u64,
    pub memory_sorts: u64,
    pub external_sorts: u64,
    pub spill_runs: u64,
    pub spill_bytes: u64,
    pub cancellations: u64,
}
