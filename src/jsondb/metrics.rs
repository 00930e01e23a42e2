// Store metrics
//
// Counters for reads, mutations and their outcomes, plus mutation timing
// with slow-mutation detection.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

const DEFAULT_SLOW_MUTATION_MS: u64 = 500;

/// Shared, cheaply cloneable metrics handle
#[derive(Debug, Clone)]
pub struct StoreMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    slow_threshold_ms: u64,

    reads: AtomicU64,
    read_failures: AtomicU64,

    mutations: AtomicU64,
    mutations_committed: AtomicU64,
    mutator_rejections: AtomicU64,
    rule_rejections: AtomicU64,
    persist_failures: AtomicU64,

    rows_written: AtomicU64,
    tables_written: AtomicU64,
    schema_drift_recoveries: AtomicU64,
    backups_written: AtomicU64,

    // Microseconds
    total_mutation_time_us: AtomicU64,
    slow_mutations: AtomicU64,
}

/// How a mutation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Current document could not be loaded
    LoadFailed,
    Committed,
    MutatorRejected,
    RuleRejected,
    PersistFailed,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::with_slow_threshold(Duration::from_millis(DEFAULT_SLOW_MUTATION_MS))
    }

    pub fn with_slow_threshold(threshold: Duration) -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                slow_threshold_ms: threshold.as_millis() as u64,
                reads: AtomicU64::new(0),
                read_failures: AtomicU64::new(0),
                mutations: AtomicU64::new(0),
                mutations_committed: AtomicU64::new(0),
                mutator_rejections: AtomicU64::new(0),
                rule_rejections: AtomicU64::new(0),
                persist_failures: AtomicU64::new(0),
                rows_written: AtomicU64::new(0),
                tables_written: AtomicU64::new(0),
                schema_drift_recoveries: AtomicU64::new(0),
                backups_written: AtomicU64::new(0),
                total_mutation_time_us: AtomicU64::new(0),
                slow_mutations: AtomicU64::new(0),
            }),
        }
    }

    pub fn record_read(&self, ok: bool) {
        self.inner.reads.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.inner.read_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_table_write(&self, rows: usize) {
        self.inner.tables_written.fetch_add(1, Ordering::Relaxed);
        self.inner.rows_written.fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn record_schema_drift(&self) {
        self.inner.schema_drift_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backup(&self) {
        self.inner.backups_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Start timing a mutation; finish with [`MutationTimer::finish`]
    pub fn start_mutation(&self, label: &str) -> MutationTimer {
        self.inner.mutations.fetch_add(1, Ordering::Relaxed);
        MutationTimer {
            start: Instant::now(),
            label: label.to_string(),
            metrics: self.clone(),
        }
    }

    fn record_mutation(&self, label: &str, outcome: MutationOutcome, duration: Duration) {
        let counter = match outcome {
            MutationOutcome::LoadFailed => &self.inner.read_failures,
            MutationOutcome::Committed => &self.inner.mutations_committed,
            MutationOutcome::MutatorRejected => &self.inner.mutator_rejections,
            MutationOutcome::RuleRejected => &self.inner.rule_rejections,
            MutationOutcome::PersistFailed => &self.inner.persist_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_mutation_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > self.inner.slow_threshold_ms {
            self.inner.slow_mutations.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(label, elapsed_ms = duration.as_millis() as u64, "Slow mutation");
        }
    }

    /// Average mutation time in milliseconds
    pub fn avg_mutation_time_ms(&self) -> f64 {
        let count = self.inner.mutations.load(Ordering::Relaxed);
        let total_us = self.inner.total_mutation_time_us.load(Ordering::Relaxed);

        if count == 0 {
            0.0
        } else {
            (total_us as f64 / count as f64) / 1000.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSummary {
            reads: load(&self.inner.reads),
            read_failures: load(&self.inner.read_failures),
            mutations: load(&self.inner.mutations),
            mutations_committed: load(&self.inner.mutations_committed),
            mutator_rejections: load(&self.inner.mutator_rejections),
            rule_rejections: load(&self.inner.rule_rejections),
            persist_failures: load(&self.inner.persist_failures),
            rows_written: load(&self.inner.rows_written),
            tables_written: load(&self.inner.tables_written),
            schema_drift_recoveries: load(&self.inner.schema_drift_recoveries),
            backups_written: load(&self.inner.backups_written),
            avg_mutation_time_ms: self.avg_mutation_time_ms(),
            slow_mutations: load(&self.inner.slow_mutations),
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            "Store metrics: {} reads ({} failed), {} mutations ({} committed, {} mutator rejections, \
             {} rule rejections, {} persist failures), avg {:.2}ms, {} slow, {} rows written",
            summary.reads,
            summary.read_failures,
            summary.mutations,
            summary.mutations_committed,
            summary.mutator_rejections,
            summary.rule_rejections,
            summary.persist_failures,
            summary.avg_mutation_time_ms,
            summary.slow_mutations,
            summary.rows_written,
        );
    }
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Times one mutation
pub struct MutationTimer {
    start: Instant,
    label: String,
    metrics: StoreMetrics,
}

impl MutationTimer {
    pub fn finish(self, outcome: MutationOutcome) {
        let duration = self.start.elapsed();
        self.metrics.record_mutation(&self.label, outcome, duration);
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricsSummary {
    pub reads: u64,
    pub read_failures: u64,
    pub mutations: u64,
    pub mutations_committed: u64,
    pub mutator_rejections: u64,
    pub rule_rejections: u64,
    pub persist_failures: u64,
    pub rows_written: u64,
    pub tables_written: u64,
    pub schema_drift_recoveries: u64,
    pub backups_written: u64,
    pub avg_mutation_time_ms: f64,
    pub slow_mutations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = StoreMetrics::new();
        assert_eq!(metrics.avg_mutation_time_ms(), 0.0);
        assert_eq!(metrics.summary().mutations, 0);
    }

    #[test]
    fn test_outcomes_are_counted() {
        let metrics = StoreMetrics::new();
        metrics.start_mutation("booking").finish(MutationOutcome::Committed);
        metrics.start_mutation("booking").finish(MutationOutcome::RuleRejected);
        metrics.start_mutation("food").finish(MutationOutcome::PersistFailed);
        metrics.record_read(true);
        metrics.record_read(false);
        metrics.record_table_write(3);

        let summary = metrics.summary();
        assert_eq!(summary.mutations, 3);
        assert_eq!(summary.mutations_committed, 1);
        assert_eq!(summary.rule_rejections, 1);
        assert_eq!(summary.persist_failures, 1);
        assert_eq!(summary.reads, 2);
        assert_eq!(summary.read_failures, 1);
        assert_eq!(summary.rows_written, 3);
    }

    #[test]
    fn test_slow_mutation_detection() {
        let metrics = StoreMetrics::with_slow_threshold(Duration::from_millis(5));
        let timer = metrics.start_mutation("booking");
        thread::sleep(Duration::from_millis(20));
        timer.finish(MutationOutcome::Committed);

        let summary = metrics.summary();
        assert_eq!(summary.slow_mutations, 1);
        assert!(summary.avg_mutation_time_ms >= 20.0);
    }
}
