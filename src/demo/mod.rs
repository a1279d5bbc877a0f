//! Bounded work-queue demo
//!
//! Pushes a fixed list of timed tasks through a [`TaskRunner`] all at once
//! and reports progress to a [`TaskSink`]. Durations are scripted, never
//! random, so two runs with the same config behave the same.

pub mod sink;

pub use sink::{RecordingSink, TaskEvent, TaskSink, TracingSink};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::runtime::{RunnerResult, TaskRunner};

#[cfg(test)]
mod tests;

/// Demo task identifier, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

impl TaskId {
    /// Get the inner value.
    #[inline]
    pub fn inner(&self) -> usize {
        self.0
    }
}

impl From<usize> for TaskId {
    fn from(val: usize) -> Self {
        Self(val)
    }
}

impl fmt::Display for TaskId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Task {}", self.0)
    }
}

/// One scripted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    pub id: TaskId,
    pub duration: Duration,
    /// Fail instead of completing once the duration has elapsed.
    pub fail: bool,
}

impl TaskSpec {
    pub fn new(
        id: usize,
        duration: Duration,
    ) -> Self {
        Self {
            id: TaskId(id),
            duration,
            fail: false,
        }
    }

    /// Mark this task as failing.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Build specs from millisecond durations, numbering from 1.
    ///
    /// Tasks whose id appears in `fail` are scripted to fail.
    pub fn from_millis(
        durations_ms: &[u64],
        fail: &[usize],
    ) -> Vec<TaskSpec> {
        durations_ms
            .iter()
            .enumerate()
            .map(|(index, &ms)| {
                let spec = TaskSpec::new(index + 1, Duration::from_millis(ms));
                if fail.contains(&spec.id.0) {
                    spec.failing()
                } else {
                    spec
                }
            })
            .collect()
    }
}

/// Failure of a demo task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DemoError {
    /// Task was scripted to fail
    #[error("{id} failed")]
    TaskFailed { id: TaskId },
}

/// Outcome of one demo run.
#[derive(Debug, Clone)]
pub struct DemoReport {
    /// Concurrency limit used.
    pub limit: usize,
    /// Tasks submitted.
    pub tasks: usize,
    /// Tasks that completed successfully.
    pub completed: usize,
    /// Failures, in submission order.
    pub failures: Vec<DemoError>,
    /// Wall-clock time for the whole run.
    pub elapsed: Duration,
    /// Sum of all task durations, i.e. the time a one-at-a-time run takes.
    pub serial: Duration,
    /// Most tasks observed running at once.
    pub peak_in_flight: usize,
}

impl DemoReport {
    /// Serial time over actual time.
    pub fn speedup(&self) -> f64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed == 0.0 {
            return 1.0;
        }
        self.serial.as_secs_f64() / elapsed
    }
}

impl fmt::Display for DemoReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "Concurrency : {}", self.limit)?;
        writeln!(f, "Tasks       : {}", self.tasks)?;
        writeln!(f, "Completed   : {}", self.completed)?;
        writeln!(f, "Failed      : {}", self.failures.len())?;
        writeln!(f, "Peak        : {}", self.peak_in_flight)?;
        writeln!(f, "Total time  : {}ms", self.elapsed.as_millis())?;
        write!(
            f,
            "Serial time : {}ms ({:.2}x)",
            self.serial.as_millis(),
            self.speedup()
        )
    }
}

/// Run every task through `runner` concurrently and wait for all of them.
///
/// Expects a fresh runner: the reported peak comes from the runner's
/// lifetime statistics.
pub async fn run_queue_demo(
    runner: &TaskRunner,
    tasks: &[TaskSpec],
    sink: Arc<dyn TaskSink>,
) -> RunnerResult<DemoReport> {
    debug!("queue demo: {} tasks, limit {}", tasks.len(), runner.limit());
    let started = Instant::now();

    let units = tasks.iter().copied().map(|spec| {
        let sink = sink.clone();
        let observer = runner.clone();
        async move {
            sink.task_started(spec.id, observer.running());
            tokio::time::sleep(spec.duration).await;

            if spec.fail {
                sink.task_failed(spec.id, observer.running());
                return Err(DemoError::TaskFailed { id: spec.id });
            }
            sink.task_completed(spec.id, spec.duration, observer.running());
            Ok(spec.id)
        }
    });

    let results = runner.run_all(units).await?;
    let elapsed = started.elapsed();

    let mut completed = 0;
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(_) => completed += 1,
            Err(err) => failures.push(err),
        }
    }

    Ok(DemoReport {
        limit: runner.limit(),
        tasks: tasks.len(),
        completed,
        failures,
        elapsed,
        serial: tasks.iter().map(|spec| spec.duration).sum(),
        peak_in_flight: runner.stats().peak_in_flight,
    })
}
