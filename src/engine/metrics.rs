use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::Serialize;

const LATENCY_BUCKETS: [u64; 6] = [100, 500, 1_000, 5_000, 10_000, u64::MAX];

/// Process-wide engine counters, reset on restart.
#[derive(Default)]
pub struct EngineMetrics {
    questions_served: AtomicU64,
    done_results: AtomicU64,
    answers_applied: AtomicU64,
    unlock_events: AtomicU64,
    achievements_awarded: AtomicU64,
    errors: AtomicU64,
    last_answer_at: AtomicI64,
    latency_buckets: [AtomicU64; 6],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineMetricsSnapshot {
    pub questions_served: u64,
    pub done_results: u64,
    pub answers_applied: u64,
    pub unlock_events: u64,
    pub achievements_awarded: u64,
    pub errors: u64,
    /// Unix millis of the last applied answer, 0 if none.
    pub last_answer_at: i64,
    pub latency_p50_us: f64,
    pub latency_p95_us: f64,
    pub latency_p99_us: f64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_question(&self, latency_us: u64) {
        self.questions_served.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency_us);
    }

    pub fn record_done(&self, latency_us: u64) {
        self.done_results.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency_us);
    }

    pub fn record_answer(&self, unlock_events: usize, achievements: usize, latency_us: u64) {
        self.answers_applied.fetch_add(1, Ordering::Relaxed);
        self.unlock_events
            .fetch_add(unlock_events as u64, Ordering::Relaxed);
        self.achievements_awarded
            .fetch_add(achievements as u64, Ordering::Relaxed);
        self.last_answer_at
            .store(chrono::Utc::now().timestamp_millis(), Ordering::Relaxed);
        self.record_latency(latency_us);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, latency_us: u64) {
        for (i, &threshold) in LATENCY_BUCKETS.iter().enumerate() {
            if latency_us <= threshold {
                self.latency_buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
    }

    fn percentiles(&self) -> (f64, f64, f64) {
        let counts: Vec<u64> = self
            .latency_buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect();
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return (0.0, 0.0, 0.0);
        }

        let bucket_midpoints: [f64; 6] = [50.0, 300.0, 750.0, 3000.0, 7500.0, 15000.0];

        let percentile = |pct: f64| -> f64 {
            let target = (pct / 100.0 * total as f64).ceil() as u64;
            let mut cumulative = 0u64;
            for (i, &count) in counts.iter().enumerate() {
                cumulative += count;
                if cumulative >= target {
                    return bucket_midpoints[i];
                }
            }
            bucket_midpoints[5]
        };

        (percentile(50.0), percentile(95.0), percentile(99.0))
    }

    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        let (p50, p95, p99) = self.percentiles();
        EngineMetricsSnapshot {
            questions_served: self.questions_served.load(Ordering::Relaxed),
            done_results: self.done_results.load(Ordering::Relaxed),
            answers_applied: self.answers_applied.load(Ordering::Relaxed),
            unlock_events: self.unlock_events.load(Ordering::Relaxed),
            achievements_awarded: self.achievements_awarded.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            last_answer_at: self.last_answer_at.load(Ordering::Relaxed),
            latency_p50_us: p50,
            latency_p95_us: p95,
            latency_p99_us: p99,
        }
    }
}
