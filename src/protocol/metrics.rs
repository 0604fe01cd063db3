//! Request metrics - outcome counters and latency

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metrics sink trait - purely observational
pub trait MetricsSink: Send + Sync {
    /// Record one finished request
    fn record(&self, success: bool, duration: Duration);

    /// Current counters with derived stats
    fn snapshot(&self) -> MetricsSnapshot;

    /// Zero all counters and restart the uptime clock
    fn reset(&self);
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub started_at: DateTime<Utc>,
    /// Seconds since `started_at`
    pub uptime: f64,
    pub request_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    /// Total latency in seconds
    pub total_latency: f64,
    pub success_rate: f64,
    /// Average latency in seconds
    pub average_latency: f64,
}

#[derive(Debug)]
struct Counters {
    request_count: u64,
    success_count: u64,
    error_count: u64,
    total_latency: Duration,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl Counters {
    fn fresh() -> Self {
        Self {
            request_count: 0,
            success_count: 0,
            error_count: 0,
            total_latency: Duration::ZERO,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }
}

/// In-memory metrics accumulator
pub struct InMemoryMetrics {
    counters: Mutex<Counters>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(Counters::fresh()),
        }
    }
}

impl Default for InMemoryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record(&self, success: bool, duration: Duration) {
        let mut c = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        c.request_count += 1;
        if success {
            c.success_count += 1;
        } else {
            c.error_count += 1;
        }
        c.total_latency += duration;
    }

    fn snapshot(&self) -> MetricsSnapshot {
        let c = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let total_latency = c.total_latency.as_secs_f64();

        let (success_rate, average_latency) = if c.request_count > 0 {
            let n = c.request_count as f64;
            (c.success_count as f64 / n, total_latency / n)
        } else {
            (0.0, 0.0)
        };

        MetricsSnapshot {
            started_at: c.started_at,
            uptime: c.started.elapsed().as_secs_f64(),
            request_count: c.request_count,
            success_count: c.success_count,
            error_count: c.error_count,
            total_latency,
            success_rate,
            average_latency,
        }
    }

    fn reset(&self) {
        *self.counters.lock().unwrap_or_else(|e| e.into_inner()) = Counters::fresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_has_zero_rates() {
        let metrics = InMemoryMetrics::new();
        let snap = metrics.snapshot();
        assert_eq!(snap.request_count, 0);
        assert_eq!(snap.success_rate, 0.0);
        assert_eq!(snap.average_latency, 0.0);
    }

    #[test]
    fn test_record_and_derived_stats() {
        let metrics = InMemoryMetrics::new();
        metrics.record(true, Duration::from_millis(100));
        metrics.record(true, Duration::from_millis(300));
        metrics.record(false, Duration::from_millis(200));
        metrics.record(true, Duration::from_millis(400));

        let snap = metrics.snapshot();
        assert_eq!(snap.request_count, 4);
        assert_eq!(snap.success_count, 3);
        assert_eq!(snap.error_count, 1);
        assert!((snap.success_rate - 0.75).abs() < 1e-9);
        assert!((snap.total_latency - 1.0).abs() < 1e-9);
        assert!((snap.average_latency - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let metrics = InMemoryMetrics::new();
        let before = metrics.snapshot().started_at;
        metrics.record(true, Duration::from_secs(1));

        std::thread::sleep(Duration::from_millis(5));
        metrics.reset();

        let snap = metrics.snapshot();
        assert_eq!(snap.request_count, 0);
        assert_eq!(snap.success_count, 0);
        assert_eq!(snap.total_latency, 0.0);
        assert!(snap.started_at > before);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = InMemoryMetrics::new();
        metrics.record(true, Duration::from_millis(10));
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["request_count"], 1);
        assert!(json.get("started_at").is_some());
    }
}
