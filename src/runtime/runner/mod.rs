//! Admission-gated task runner
//!
//! [`TaskRunner`] accepts any number of concurrent submissions and lets at
//! most `limit` of them execute at once. Everyone else waits on the shared
//! [`AdmissionGate`] until a slot frees. Unit failures are handed back to the
//! caller that submitted the unit and never touch sibling submissions.

pub mod stats;

pub use stats::{RunnerStats, StatsSnapshot};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::debug;

use super::error::RunnerResult;
use super::gate::{AdmissionGate, ConcurrencyLimit, SlotGuard};


/// Bounded-concurrency runner.
///
/// Clones share the same slot budget and statistics.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    gate: Arc<AdmissionGate>,
    stats: Arc<RunnerStats>,
}

impl TaskRunner {
    /// Create a runner allowing `limit` concurrent units.
    ///
    /// Fails with [`RunnerError::InvalidLimit`](super::error::RunnerError::InvalidLimit)
    /// when `limit` is zero.
    pub fn new(limit: usize) -> RunnerResult<Self> {
        Ok(Self::with_limit(ConcurrencyLimit::new(limit)?))
    }

    /// Create a runner from an already validated limit.
    pub fn with_limit(limit: ConcurrencyLimit) -> Self {
        debug!("runner created with limit {}", limit);
        Self {
            gate: Arc::new(AdmissionGate::new(limit)),
            stats: Arc::new(RunnerStats::default()),
        }
    }

    /// Wait for a slot, run `unit`, release the slot.
    ///
    /// The unit's own result is returned unchanged. The slot is released
    /// exactly once whether the unit succeeds, fails, panics, or this
    /// future is dropped mid-flight.
    pub async fn submit<F, T, E>(
        &self,
        unit: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.stats.record_submitted();
        let slot = self.gate.acquire().await;
        let admitted = Admitted::new(slot, &self.stats);

        let result = unit.await;
        admitted.finish(&result);
        result
    }

    /// Blocking counterpart of [`submit`](Self::submit) for OS threads.
    ///
    /// Parks the calling thread while no slot is free. Must not be called
    /// from inside an async context.
    pub fn submit_blocking<F, T, E>(
        &self,
        unit: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.stats.record_submitted();
        let slot = self.gate.acquire_blocking();
        let admitted = Admitted::new(slot, &self.stats);

        let result = unit();
        admitted.finish(&result);
        result
    }

    /// Submit every unit concurrently and wait for all of them.
    ///
    /// Results come back in submission order. A unit that panics is
    /// reported as [`RunnerError::Join`](super::error::RunnerError::Join)
    /// once all other units have finished.
    pub async fn run_all<I, F, T, E>(
        &self,
        units: I,
    ) -> RunnerResult<Vec<Result<T, E>>>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let mut set = JoinSet::new();
        for (index, unit) in units.into_iter().enumerate() {
            let runner = self.clone();
            set.spawn(async move { (index, runner.submit(unit).await) });
        }
        debug!("fan-out of {} units (limit {})", set.len(), self.limit());

        let mut results: Vec<Option<Result<T, E>>> = (0..set.len()).map(|_| None).collect();
        let mut join_error = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(err) => {
                    join_error.get_or_insert(err);
                }
            }
        }

        if let Some(err) = join_error {
            return Err(err.into());
        }
        Ok(results.into_iter().flatten().collect())
    }

    /// Units executing right now.
    #[inline]
    pub fn running(&self) -> usize {
        self.gate.in_flight()
    }

    /// Submissions waiting for a slot right now.
    #[inline]
    pub fn waiting(&self) -> usize {
        self.gate.waiting()
    }

    /// Configured concurrency limit.
    #[inline]
    pub fn limit(&self) -> usize {
        self.gate.limit()
    }

    /// Current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// An executing unit. Records completion on drop, before its slot frees.
struct Admitted<'a> {
    _slot: SlotGuard<'a>,
    stats: &'a RunnerStats,
    started: Instant,
    failed: bool,
}

impl<'a> Admitted<'a> {
    fn new(
        slot: SlotGuard<'a>,
        stats: &'a RunnerStats,
    ) -> Self {
        stats.update_parallelism(slot.in_flight_at_admission());
        Self {
            _slot: slot,
            stats,
            started: Instant::now(),
            // Anything short of `finish` (panic, drop) counts as a failure.
            failed: true,
        }
    }

    fn finish<T, E>(
        mut self,
        result: &Result<T, E>,
    ) {
        self.failed = result.is_err();
    }
}

impl Drop for Admitted<'_> {
    fn drop(&mut self) {
        let duration_us = self.started.elapsed().as_micros() as usize;
        self.stats.record_completed(duration_us, self.failed);
    }
}
