use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{ProcessesToUpdate, System};

const LATENCY_WINDOW: usize = 1000;
const LATENCY_TRIM: usize = 500;

/// Engine-level counters exposed to the management layer for display.
pub struct EngineStats {
    started_at: Mutex<Option<Instant>>,
    messages_processed: AtomicU64,
    successful_forwards: AtomicU64,
    failed_forwards: AtomicU64,
    latencies_ms: Mutex<VecDeque<u64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub running: bool,
    pub uptime_seconds: u64,
    pub active_monitors: usize,
    pub messages_processed: u64,
    pub successful_forwards: u64,
    pub failed_forwards: u64,
    pub success_rate: f64,
    pub avg_processing_time_ms: f64,
    pub memory_usage_mb: f64,
    pub duplicate_tracker_size: usize,
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            started_at: Mutex::new(None),
            messages_processed: AtomicU64::new(0),
            successful_forwards: AtomicU64::new(0),
            failed_forwards: AtomicU64::new(0),
            latencies_ms: Mutex::new(VecDeque::new()),
        }
    }

    pub fn mark_started(&self) {
        *self.started_at.lock().unwrap() = Some(Instant::now());
    }

    /// One call per fully-processed message; `successes` counts the targets
    /// that accepted the forward.
    pub fn record_processing(&self, elapsed: Duration, successes: usize) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);

        if successes > 0 {
            self.successful_forwards
                .fetch_add(successes as u64, Ordering::Relaxed);
        } else {
            self.failed_forwards.fetch_add(1, Ordering::Relaxed);
        }

        let mut latencies = self.latencies_ms.lock().unwrap();
        latencies.push_back(elapsed.as_millis() as u64);

        if latencies.len() > LATENCY_WINDOW {
            while latencies.len() > LATENCY_TRIM {
                latencies.pop_front();
            }
        }
    }

    /// Periodic eviction keeps the latency ring bounded even while idle.
    pub fn trim(&self) {
        let mut latencies = self.latencies_ms.lock().unwrap();

        while latencies.len() > LATENCY_TRIM {
            latencies.pop_front();
        }
    }

    pub fn report(
        &self,
        running: bool,
        active_monitors: usize,
        duplicate_tracker_size: usize,
    ) -> StatsReport {
        let uptime_seconds = self
            .started_at
            .lock()
            .unwrap()
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0);

        let successful = self.successful_forwards.load(Ordering::Relaxed);
        let failed = self.failed_forwards.load(Ordering::Relaxed);
        let total = successful + failed;

        let success_rate = if total > 0 {
            successful as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let avg_processing_time_ms = {
            let latencies = self.latencies_ms.lock().unwrap();

            if latencies.is_empty() {
                0.0
            } else {
                latencies.iter().sum::<u64>() as f64 / latencies.len() as f64
            }
        };

        StatsReport {
            running,
            uptime_seconds,
            active_monitors,
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            successful_forwards: successful,
            failed_forwards: failed,
            success_rate,
            avg_processing_time_ms,
            memory_usage_mb: memory_usage_mb(),
            duplicate_tracker_size,
        }
    }
}

fn memory_usage_mb() -> f64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0.0;
    };

    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    system
        .process(pid)
        .map(|process| process.memory() as f64 / 1024.0 / 1024.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_reflects_recorded_outcomes() {
        let stats = EngineStats::new();

        stats.record_processing(Duration::from_millis(10), 2);
        stats.record_processing(Duration::from_millis(20), 0);

        let report = stats.report(true, 1, 0);

        assert_eq!(report.messages_processed, 2);
        assert_eq!(report.successful_forwards, 2);
        assert_eq!(report.failed_forwards, 1);
        assert!((report.success_rate - 66.666).abs() < 0.1);
        assert!((report.avg_processing_time_ms - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn latency_ring_stays_bounded() {
        let stats = EngineStats::new();

        for _ in 0..(LATENCY_WINDOW + 100) {
            stats.record_processing(Duration::from_millis(1), 1);
        }

        let size = stats.latencies_ms.lock().unwrap().len();
        assert!(size <= LATENCY_WINDOW);
    }
}
