use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How a dispatch finished, for metrics purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Success,
    /// Handler returned an error, or the operation could not be resolved
    Failure,
    /// Handler panicked
    Panic,
}

#[derive(Default)]
struct OperationCounters {
    count: AtomicU64,
    failures: AtomicU64,
    panics: AtomicU64,
    total_latency_ns: AtomicU64,
    max_latency_ns: AtomicU64,
}

/// Point-in-time view of one operation's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationStats {
    pub count: u64,
    pub failures: u64,
    pub panics: u64,
    pub average_latency: Duration,
    pub max_latency: Duration,
}

/// Per-operation dispatch counters.
///
/// Counters are atomics inside a `DashMap` keyed by operation, so recording
/// never takes a global lock. Values are eventually consistent.
#[derive(Default)]
pub struct DispatchMetrics {
    operations: DashMap<String, OperationCounters>,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, operation: &str, elapsed: Duration, status: DispatchStatus) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        if let Some(counters) = self.operations.get(operation) {
            Self::apply(&counters, nanos, status);
            return;
        }
        let counters = self.operations.entry(operation.to_string()).or_default();
        Self::apply(&counters, nanos, status);
    }

    fn apply(counters: &OperationCounters, nanos: u64, status: DispatchStatus) {
        counters.count.fetch_add(1, Ordering::Relaxed);
        counters.total_latency_ns.fetch_add(nanos, Ordering::Relaxed);
        counters.max_latency_ns.fetch_max(nanos, Ordering::Relaxed);
        match status {
            DispatchStatus::Success => {}
            DispatchStatus::Failure => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
            }
            DispatchStatus::Panic => {
                counters.panics.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Stats for one operation, `None` if it was never dispatched.
    pub fn stats(&self, operation: &str) -> Option<OperationStats> {
        self.operations.get(operation).map(|c| {
            let count = c.count.load(Ordering::Relaxed);
            let total = c.total_latency_ns.load(Ordering::Relaxed);
            OperationStats {
                count,
                failures: c.failures.load(Ordering::Relaxed),
                panics: c.panics.load(Ordering::Relaxed),
                average_latency: if count == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_nanos(total / count)
                },
                max_latency: Duration::from_nanos(c.max_latency_ns.load(Ordering::Relaxed)),
            }
        })
    }

    /// All recorded operations with their stats, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, OperationStats)> {
        let mut names: Vec<String> = self.operations.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.stats(&name).map(|s| (name, s)))
            .collect()
    }

    /// Total dispatches across all operations.
    pub fn total_count(&self) -> u64 {
        self.operations
            .iter()
            .map(|e| e.value().count.load(Ordering::Relaxed))
            .sum()
    }
}
