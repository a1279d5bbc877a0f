//! Property tests for the slot bound
//!
//! For any limit and any number of units: never more than `limit` running,
//! every unit accounted for exactly once, nothing left in flight.

use proptest::prelude::*;
use slotgate::TaskRunner;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct Overlap {
    current: AtomicUsize,
    max: AtomicUsize,
    runs: AtomicUsize,
}

impl Overlap {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        self.runs.fetch_add(1, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_async_bound_holds(
        limit in 1usize..=5,
        durations in prop::collection::vec(1u64..50, 0..16),
        fail_mask in any::<u16>(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let runner = TaskRunner::new(limit).unwrap();
        let overlap = Arc::new(Overlap::default());
        let n = durations.len();

        let results = rt.block_on(async {
            let units = durations.iter().copied().enumerate().map(|(i, ms)| {
                let overlap = overlap.clone();
                async move {
                    overlap.enter();
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    overlap.exit();
                    if fail_mask & (1 << i) != 0 { Err(i) } else { Ok(i) }
                }
            });
            runner.run_all(units).await.unwrap()
        });

        let expected_failures = (0..n).filter(|i| fail_mask & (1 << i) != 0).count();
        let stats = runner.stats();

        prop_assert_eq!(results.len(), n);
        prop_assert!(overlap.max.load(Ordering::SeqCst) <= limit);
        prop_assert_eq!(overlap.runs.load(Ordering::SeqCst), n);
        prop_assert_eq!(stats.submitted, n);
        prop_assert_eq!(stats.completed, n);
        prop_assert_eq!(stats.failed, expected_failures);
        prop_assert!(stats.peak_in_flight <= limit);
        prop_assert_eq!(runner.running(), 0);
        if n > 0 {
            prop_assert_eq!(stats.peak_in_flight, limit.min(n));
        }
    }

    #[test]
    fn prop_blocking_bound_holds(
        limit in 1usize..=4,
        threads in 0usize..=8,
    ) {
        let runner = TaskRunner::new(limit).unwrap();
        let overlap = Arc::new(Overlap::default());

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let runner = runner.clone();
                let overlap = overlap.clone();
                thread::spawn(move || {
                    runner.submit_blocking(|| {
                        overlap.enter();
                        thread::sleep(Duration::from_millis(1));
                        overlap.exit();
                        Ok::<_, ()>(i)
                    })
                })
            })
            .collect();

        for handle in handles {
            prop_assert!(handle.join().unwrap().is_ok());
        }

        prop_assert!(overlap.max.load(Ordering::SeqCst) <= limit);
        prop_assert_eq!(overlap.runs.load(Ordering::SeqCst), threads);
        prop_assert_eq!(runner.stats().completed, threads);
        prop_assert_eq!(runner.running(), 0);
        prop_assert_eq!(runner.waiting(), 0);
    }
}
