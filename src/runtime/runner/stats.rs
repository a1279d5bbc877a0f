//! Runner statistics.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Live counters for one runner.
#[derive(Debug, Default)]
pub struct RunnerStats {
    /// Total units submitted.
    pub submitted: AtomicUsize,
    /// Total units that released their slot, whatever the outcome.
    pub completed: AtomicUsize,
    /// Total units that returned an error.
    pub failed: AtomicUsize,
    /// Total execution time in microseconds.
    pub total_exec_time_us: AtomicUsize,
    /// Peak number of units in flight.
    pub peak_in_flight: AtomicUsize,
}

impl RunnerStats {
    /// Record a submitted unit.
    #[inline]
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a finished unit.
    #[inline]
    pub fn record_completed(
        &self,
        duration_us: usize,
        failed: bool,
    ) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.total_exec_time_us
            .fetch_add(duration_us, Ordering::SeqCst);
        if failed {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Update the in-flight peak.
    #[inline]
    pub fn update_parallelism(
        &self,
        current: usize,
    ) {
        loop {
            let peak = self.peak_in_flight.load(Ordering::SeqCst);
            if current <= peak {
                break;
            }
            if self
                .peak_in_flight
                .compare_exchange(peak, current, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
        }
    }

    /// Take a plain copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            total_exec_time_us: self.total_exec_time_us.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time copy of [`RunnerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
    pub total_exec_time_us: usize,
    pub peak_in_flight: usize,
}

impl StatsSnapshot {
    /// Units submitted but not yet finished.
    pub fn outstanding(&self) -> usize {
        self.submitted.saturating_sub(self.completed)
    }

    /// Fraction of finished units that failed.
    pub fn failure_rate(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.failed as f64 / self.completed as f64
    }
}
