//! Queue demo 单元测试

use crate::demo::{run_queue_demo, DemoError, RecordingSink, TaskEvent, TaskId, TaskSpec};
use crate::runtime::TaskRunner;
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
mod task_spec_tests {
    use super::*;

    #[test]
    fn test_task_id_display() {
        assert_eq!(TaskId(3).to_string(), "Task 3");
        assert_eq!(TaskId::from(7).inner(), 7);
    }

    #[test]
    fn test_from_millis_numbers_from_one() {
        let specs = TaskSpec::from_millis(&[800, 900, 1000], &[]);
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].id, TaskId(1));
        assert_eq!(specs[2].id, TaskId(3));
        assert_eq!(specs[1].duration, Duration::from_millis(900));
        assert!(specs.iter().all(|spec| !spec.fail));
    }

    #[test]
    fn test_from_millis_marks_failures() {
        let specs = TaskSpec::from_millis(&[100, 100, 100], &[2, 9]);
        assert!(!specs[0].fail);
        assert!(specs[1].fail);
        assert!(!specs[2].fail);
    }

    #[test]
    fn test_demo_error_display() {
        let err = DemoError::TaskFailed { id: TaskId(4) };
        assert_eq!(err.to_string(), "Task 4 failed");
    }
}

#[cfg(test)]
mod sink_tests {
    use super::*;
    use crate::demo::TaskSink;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.task_started(TaskId(1), 1);
        sink.task_completed(TaskId(1), Duration::from_millis(5), 1);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], TaskEvent::Started { id: TaskId(1), running: 1 });
        assert_eq!(events[1].id(), TaskId(1));
    }

    #[test]
    fn test_max_overlap() {
        let sink = RecordingSink::new();
        sink.task_started(TaskId(1), 1);
        sink.task_started(TaskId(2), 2);
        sink.task_failed(TaskId(1), 2);
        sink.task_started(TaskId(3), 2);
        sink.task_completed(TaskId(2), Duration::ZERO, 2);
        sink.task_completed(TaskId(3), Duration::ZERO, 1);
        assert_eq!(sink.max_overlap(), 2);
    }
}

#[cfg(test)]
mod run_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_two_slots_six_tasks() {
        let runner = TaskRunner::new(2).unwrap();
        let sink = Arc::new(RecordingSink::new());
        let specs = TaskSpec::from_millis(&[800, 900, 1000, 1100, 1200, 1000], &[]);

        let report = run_queue_demo(&runner, &specs, sink.clone()).await.unwrap();

        assert_eq!(report.tasks, 6);
        assert_eq!(report.completed, 6);
        assert!(report.failures.is_empty());
        assert_eq!(report.peak_in_flight, 2);
        assert!(report.elapsed >= Duration::from_millis(3 * 800));
        assert!(report.elapsed < report.serial);
        assert!(report.speedup() > 1.0);

        assert!(sink.max_overlap() <= 2);
        assert!(sink.events().iter().all(|event| event.running() <= 2));
        assert_eq!(sink.events().len(), 12);
        assert_eq!(runner.running(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_task_does_not_stop_others() {
        let runner = TaskRunner::new(2).unwrap();
        let sink = Arc::new(RecordingSink::new());
        let specs = TaskSpec::from_millis(&[100, 100, 100, 100], &[3]);

        let report = run_queue_demo(&runner, &specs, sink.clone()).await.unwrap();

        assert_eq!(report.completed, 3);
        assert_eq!(report.failures, vec![DemoError::TaskFailed { id: TaskId(3) }]);
        assert_eq!(runner.running(), 0);

        let failed: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|event| matches!(event, TaskEvent::Failed { .. }))
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id(), TaskId(3));
    }

    #[tokio::test]
    async fn test_empty_demo() {
        let runner = TaskRunner::new(2).unwrap();
        let sink = Arc::new(RecordingSink::new());

        let report = run_queue_demo(&runner, &[], sink.clone()).await.unwrap();

        assert_eq!(report.tasks, 0);
        assert_eq!(report.completed, 0);
        assert_eq!(report.serial, Duration::ZERO);
        assert!(sink.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_display() {
        let runner = TaskRunner::new(3).unwrap();
        let sink = Arc::new(RecordingSink::new());
        let specs = TaskSpec::from_millis(&[100, 200], &[]);

        let report = run_queue_demo(&runner, &specs, sink).await.unwrap();
        let text = report.to_string();

        assert!(text.contains("Concurrency : 3"));
        assert!(text.contains("Tasks       : 2"));
        assert!(text.contains("Serial time : 300ms"));
    }
}
