//! Prometheus metrics for the explorer and HTTP surface.
//!
//! # Metrics
//!
//! - `bullmq_queue_jobs{queue,state}` — per-queue-per-state gauges,
//!   refreshed on every stats computation (request-driven or poller-driven).
//!   `state` includes the pseudo-state `orphaned`.
//! - `redis_operation_duration_seconds{operation}` — explorer operation
//!   latency.
//! - `redis_operation_errors_total{operation}` — degraded or failed reads,
//!   counted at the operation that absorbed them.
//! - `http_request_duration_seconds{method,path,status}` — request latency.

use std::sync::LazyLock;

use prometheus::{
    CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
};

use crate::explorer::models::{QueueStats, STATE_PRECEDENCE};

/// Registry backing the `/metrics` endpoint.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let registry = Registry::new();
    registry
        .register(Box::new(QUEUE_JOBS.clone()))
        .expect("register bullmq_queue_jobs");
    registry
        .register(Box::new(STORE_OP_DURATION.clone()))
        .expect("register redis_operation_duration_seconds");
    registry
        .register(Box::new(STORE_OP_ERRORS.clone()))
        .expect("register redis_operation_errors_total");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .expect("register http_request_duration_seconds");
    registry
});

pub static QUEUE_JOBS: LazyLock<GaugeVec> = LazyLock::new(|| {
    GaugeVec::new(
        Opts::new("bullmq_queue_jobs", "Number of jobs per queue and state"),
        &["queue", "state"],
    )
    .expect("bullmq_queue_jobs metric creation failed")
});

pub static STORE_OP_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "redis_operation_duration_seconds",
            "Redis-backed explorer operation latency",
        ),
        &["operation"],
    )
    .expect("redis_operation_duration_seconds metric creation failed")
});

pub static STORE_OP_ERRORS: LazyLock<CounterVec> = LazyLock::new(|| {
    CounterVec::new(
        Opts::new(
            "redis_operation_errors_total",
            "Total number of Redis read errors, including reads degraded to zero",
        ),
        &["operation"],
    )
    .expect("redis_operation_errors_total metric creation failed")
});

pub static HTTP_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new("http_request_duration_seconds", "HTTP request latency"),
        &["method", "path", "status"],
    )
    .expect("http_request_duration_seconds metric creation failed")
});

/// Push one queue's stats into the gauge set.
pub fn record_queue_stats(stats: &QueueStats) {
    for kind in STATE_PRECEDENCE {
        QUEUE_JOBS
            .with_label_values(&[&stats.name, kind.as_state().as_str()])
            .set(stats.count(kind) as f64);
    }
    QUEUE_JOBS
        .with_label_values(&[&stats.name, "orphaned"])
        .set(stats.orphaned as f64);
}

/// Gather everything registered for text exposition.
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_gauges_cover_all_states_plus_orphaned() {
        let stats = QueueStats {
            name: "gauges".to_string(),
            wait: 3,
            orphaned: 2,
            total: 5,
            ..Default::default()
        };
        record_queue_stats(&stats);

        assert_eq!(
            QUEUE_JOBS.with_label_values(&["gauges", "waiting"]).get(),
            3.0
        );
        assert_eq!(
            QUEUE_JOBS.with_label_values(&["gauges", "orphaned"]).get(),
            2.0
        );
        assert_eq!(
            QUEUE_JOBS.with_label_values(&["gauges", "stalled"]).get(),
            0.0
        );
    }

    #[test]
    fn registry_gathers_registered_families() {
        record_queue_stats(&QueueStats {
            name: "reg".to_string(),
            ..Default::default()
        });
        let names: Vec<String> = gather().iter().map(|f| f.get_name().to_string()).collect();
        assert!(names.contains(&"bullmq_queue_jobs".to_string()));
    }
}
