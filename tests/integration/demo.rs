//! Queue demo integration tests

use slotgate::demo::{run_queue_demo, RecordingSink, TaskEvent, TaskSpec};
use slotgate::util::config::SlotgateConfig;
use slotgate::TaskRunner;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_default_config_demo() {
    let config = SlotgateConfig::default();
    let runner = TaskRunner::with_limit(config.runner.concurrency);
    let specs = TaskSpec::from_millis(&config.demo.tasks_ms, &config.demo.fail);
    let sink = Arc::new(RecordingSink::new());

    let report = run_queue_demo(&runner, &specs, sink.clone()).await.unwrap();

    // ceil(6 / 2) rounds, each at least 800ms
    assert!(report.elapsed >= Duration::from_millis(2400));
    assert!(report.elapsed <= Duration::from_millis(3 * 1200));
    assert_eq!(report.peak_in_flight, 2);
    assert_eq!(report.completed, 6);
    assert!(sink.max_overlap() <= 2);
}

#[tokio::test(start_paused = true)]
async fn test_every_task_starts_and_finishes_once() {
    let runner = TaskRunner::new(3).unwrap();
    let specs = TaskSpec::from_millis(&[50, 40, 30, 20, 10, 60, 70], &[5]);
    let sink = Arc::new(RecordingSink::new());

    run_queue_demo(&runner, &specs, sink.clone()).await.unwrap();

    let events = sink.events();
    for spec in &specs {
        let starts = events
            .iter()
            .filter(|e| matches!(e, TaskEvent::Started { id, .. } if *id == spec.id))
            .count();
        let ends = events
            .iter()
            .filter(|e| {
                matches!(e, TaskEvent::Completed { id, .. } | TaskEvent::Failed { id, .. } if *id == spec.id)
            })
            .count();
        assert_eq!(starts, 1, "{} started {} times", spec.id, starts);
        assert_eq!(ends, 1, "{} ended {} times", spec.id, ends);
    }
    assert_eq!(runner.running(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_single_slot_demo_is_serial() {
    let runner = TaskRunner::new(1).unwrap();
    let specs = TaskSpec::from_millis(&[100, 200, 300], &[]);
    let sink = Arc::new(RecordingSink::new());

    let report = run_queue_demo(&runner, &specs, sink.clone()).await.unwrap();

    assert!(report.elapsed >= report.serial);
    assert!(report.elapsed < report.serial + Duration::from_millis(10));
    assert_eq!(sink.max_overlap(), 1);
}
