//! Task event sinks
//!
//! Units of the queue demo report progress through a [`TaskSink`]. The
//! runner itself never calls a sink.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, warn};

use super::TaskId;

/// One progress report from a demo task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// Task was admitted and began executing.
    Started { id: TaskId, running: usize },
    /// Task finished successfully.
    Completed {
        id: TaskId,
        duration: Duration,
        running: usize,
    },
    /// Task failed.
    Failed { id: TaskId, running: usize },
}

impl TaskEvent {
    /// The task this event belongs to.
    pub fn id(&self) -> TaskId {
        match self {
            TaskEvent::Started { id, .. }
            | TaskEvent::Completed { id, .. }
            | TaskEvent::Failed { id, .. } => *id,
        }
    }

    /// Running count observed when the event was emitted.
    pub fn running(&self) -> usize {
        match self {
            TaskEvent::Started { running, .. }
            | TaskEvent::Completed { running, .. }
            | TaskEvent::Failed { running, .. } => *running,
        }
    }
}

/// Receives progress reports from demo tasks.
pub trait TaskSink: Send + Sync {
    /// Task admitted.
    fn task_started(
        &self,
        id: TaskId,
        running: usize,
    );

    /// Task done.
    fn task_completed(
        &self,
        id: TaskId,
        duration: Duration,
        running: usize,
    );

    /// Task failed.
    fn task_failed(
        &self,
        id: TaskId,
        running: usize,
    );
}

/// Writes one log line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TaskSink for TracingSink {
    fn task_started(
        &self,
        id: TaskId,
        running: usize,
    ) {
        info!("▶ {} running ({} in flight)", id, running);
    }

    fn task_completed(
        &self,
        id: TaskId,
        duration: Duration,
        running: usize,
    ) {
        info!(
            "✓ {} done ({}ms, {} in flight)",
            id,
            duration.as_millis(),
            running
        );
    }

    fn task_failed(
        &self,
        id: TaskId,
        running: usize,
    ) {
        warn!("✗ {} failed ({} in flight)", id, running);
    }
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TaskEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events so far.
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().clone()
    }

    /// Highest number of tasks between their start and end events.
    pub fn max_overlap(&self) -> usize {
        let mut open = 0usize;
        let mut max = 0usize;
        for event in self.events.lock().iter() {
            match event {
                TaskEvent::Started { .. } => {
                    open += 1;
                    max = max.max(open);
                }
                TaskEvent::Completed { .. } | TaskEvent::Failed { .. } => {
                    open = open.saturating_sub(1);
                }
            }
        }
        max
    }

    fn push(
        &self,
        event: TaskEvent,
    ) {
        self.events.lock().push(event);
    }
}

impl TaskSink for RecordingSink {
    fn task_started(
        &self,
        id: TaskId,
        running: usize,
    ) {
        self.push(TaskEvent::Started { id, running });
    }

    fn task_completed(
        &self,
        id: TaskId,
        duration: Duration,
        running: usize,
    ) {
        self.push(TaskEvent::Completed {
            id,
            duration,
            running,
        });
    }

    fn task_failed(
        &self,
        id: TaskId,
        running: usize,
    ) {
        self.push(TaskEvent::Failed { id, running });
    }
}
