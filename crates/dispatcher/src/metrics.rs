//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Successful connections
    connect_count: AtomicU64,
    /// Work messages published
    work_published: AtomicU64,
    /// Audit messages published
    audit_published: AtomicU64,
    /// Publish failures on either queue
    failure_count: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_count(&self) -> u64 {
        self.connect_count.load(Ordering::Relaxed)
    }

    pub fn inc_connect_count(&self) {
        self.connect_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn work_published(&self) -> u64 {
        self.work_published.load(Ordering::Relaxed)
    }

    pub fn inc_work_published(&self) {
        self.work_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn audit_published(&self) -> u64 {
        self.audit_published.load(Ordering::Relaxed)
    }

    pub fn inc_audit_published(&self) {
        self.audit_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connect_count: self.connect_count(),
            work_published: self.work_published(),
            audit_published: self.audit_published(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connect_count: u64,
    pub work_published: u64,
    pub audit_published: u64,
    pub failure_count: u64,
}
