//! Metrics collection for ingestion monitoring.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Ingestion metrics.
pub struct Metrics {
    /// Ingestion cycles started.
    pub cycles_total: AtomicU64,
    /// Cycles that committed a batch.
    pub cycles_stored: AtomicU64,
    /// Cycles skipped because every source failed.
    pub cycles_skipped: AtomicU64,
    /// Cycles that fetched quotes but failed to persist them.
    pub store_failures: AtomicU64,
    /// Triggers dropped because a cycle was still running.
    pub cycles_overlapped: AtomicU64,
    /// Individual source failures.
    pub source_failures: AtomicU64,
    /// Quotes committed across all batches.
    pub quotes_stored: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            cycles_total: AtomicU64::new(0),
            cycles_stored: AtomicU64::new(0),
            cycles_skipped: AtomicU64::new(0),
            store_failures: AtomicU64::new(0),
            cycles_overlapped: AtomicU64::new(0),
            source_failures: AtomicU64::new(0),
            quotes_stored: AtomicU64::new(0),
        }
    }

    /// Record a cycle start.
    pub fn cycle_started(&self) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed batch of `quotes` quotes.
    pub fn batch_stored(&self, quotes: usize) {
        self.cycles_stored.fetch_add(1, Ordering::Relaxed);
        self.quotes_stored.fetch_add(quotes as u64, Ordering::Relaxed);
    }

    /// Record a cycle with nothing to write.
    pub fn cycle_skipped(&self) {
        self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed batch write.
    pub fn store_failed(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a trigger that found a cycle in progress.
    pub fn cycle_overlapped(&self) {
        self.cycles_overlapped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` failed sources.
    pub fn sources_failed(&self, count: usize) {
        self.source_failures.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            cycles_stored: self.cycles_stored.load(Ordering::Relaxed),
            cycles_skipped: self.cycles_skipped.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            cycles_overlapped: self.cycles_overlapped.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
            quotes_stored: self.quotes_stored.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP quotefeed_cycles_total Total ingestion cycles started
# TYPE quotefeed_cycles_total counter
quotefeed_cycles_total {}

# HELP quotefeed_cycles_stored Ingestion cycles that committed a batch
# TYPE quotefeed_cycles_stored counter
quotefeed_cycles_stored {}

# HELP quotefeed_cycles_skipped Ingestion cycles with no successful source
# TYPE quotefeed_cycles_skipped counter
quotefeed_cycles_skipped {}

# HELP quotefeed_store_failures Batch writes that failed
# TYPE quotefeed_store_failures counter
quotefeed_store_failures {}

# HELP quotefeed_cycles_overlapped Triggers dropped while a cycle was running
# TYPE quotefeed_cycles_overlapped counter
quotefeed_cycles_overlapped {}

# HELP quotefeed_source_failures Individual source fetch failures
# TYPE quotefeed_source_failures counter
quotefeed_source_failures {}

# HELP quotefeed_quotes_stored Quotes committed
# TYPE quotefeed_quotes_stored counter
quotefeed_quotes_stored {}
"#,
            snapshot.cycles_total,
            snapshot.cycles_stored,
            snapshot.cycles_skipped,
            snapshot.store_failures,
            snapshot.cycles_overlapped,
            snapshot.source_failures,
            snapshot.quotes_stored,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cycles_total: u64,
    pub cycles_stored: u64,
    pub cycles_skipped: u64,
    pub store_failures: u64,
    pub cycles_overlapped: u64,
    pub source_failures: u64,
    pub quotes_stored: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;
