//! # Dispatcher Property Tests
//!
//! Cross-thread behaviour of the main-thread dispatcher:
//!
//! 1. **FIFO**: one producer's tasks run in submission order
//! 2. **Fast path**: `dispatch_sync` on the designated thread never needs a drain
//! 3. **Rendezvous**: a worker's `dispatch_sync` returns only after the drain ran it
//! 4. **Empty work**: `None` tasks leave both queues untouched
//! 5. **Independent queues**: an in-flight sync request never blocks `dispatch`
//! 6. **Snapshot drains**: work queued during a drain waits for the next one
//!
//! Run with: cargo test -p tether_core --test dispatcher_properties

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tether_core::MainThreadDispatcher;

/// Spins (with short sleeps) until `condition` holds or the deadline passes.
fn wait_for(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached within 5s");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Drains on the designated thread until every worker has finished.
fn pump_until_finished<T>(dispatcher: &MainThreadDispatcher, workers: &[JoinHandle<T>]) {
    while workers.iter().any(|w| !w.is_finished()) {
        dispatcher.process_queue();
        thread::sleep(Duration::from_millis(1));
    }
}

// ============================================================================
// FIFO
// ============================================================================

#[test]
fn test_fifo_single_producer() {
    let dispatcher = MainThreadDispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let producer = {
        let dispatcher = Arc::clone(&dispatcher);
        let log = Arc::clone(&log);
        thread::spawn(move || {
            for i in 0..1_000 {
                let log = Arc::clone(&log);
                dispatcher.dispatch(move || log.lock().push(i));
            }
        })
    };
    producer.join().unwrap();

    let report = dispatcher.process_queue();

    assert_eq!(report.async_executed, 1_000);
    assert_eq!(*log.lock(), (0..1_000).collect::<Vec<_>>());
}

#[test]
fn test_fifo_preserved_per_producer_under_contention() {
    let dispatcher = MainThreadDispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let producers = 8;
    let per_producer = 500;

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let dispatcher = Arc::clone(&dispatcher);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for i in 0..per_producer {
                    let log = Arc::clone(&log);
                    dispatcher.dispatch(move || log.lock().push((p, i)));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    dispatcher.process_queue();

    let log = log.lock();
    assert_eq!(log.len(), producers * per_producer);
    for p in 0..producers {
        let seen: Vec<_> = log.iter().filter(|(who, _)| *who == p).map(|(_, i)| *i).collect();
        assert_eq!(seen, (0..per_producer).collect::<Vec<_>>(), "producer {p} reordered");
    }
}

// ============================================================================
// FAST PATH
// ============================================================================

#[test]
fn test_sync_on_designated_thread_needs_no_drain() {
    let dispatcher = MainThreadDispatcher::new();
    let ran = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&ran);
    dispatcher.dispatch_sync(move || flag.store(true, Ordering::SeqCst));

    assert!(ran.load(Ordering::SeqCst));
    assert_eq!(dispatcher.stats().drains, 0);
}

// ============================================================================
// RENDEZVOUS
// ============================================================================

#[test]
fn test_sync_returns_only_after_drain() {
    let dispatcher = MainThreadDispatcher::new();
    let ran = Arc::new(AtomicBool::new(false));
    let hold = Duration::from_millis(50);

    let worker = {
        let dispatcher = Arc::clone(&dispatcher);
        let ran = Arc::clone(&ran);
        thread::spawn(move || {
            let start = Instant::now();
            let flag = Arc::clone(&ran);
            dispatcher.dispatch_sync(move || flag.store(true, Ordering::SeqCst));
            (start.elapsed(), ran.load(Ordering::SeqCst))
        })
    };

    wait_for(|| dispatcher.sync_queue_size() == 1);
    thread::sleep(hold);
    assert!(!worker.is_finished(), "worker returned before the drain");
    assert!(!ran.load(Ordering::SeqCst));

    let report = dispatcher.process_queue();
    assert_eq!(report.sync_executed, 1);

    let (elapsed, flag_at_return) = worker.join().unwrap();
    assert!(elapsed >= hold);
    assert!(flag_at_return, "closure must have run before dispatch_sync returned");
}

#[test]
fn test_many_sync_submitters_all_released() {
    let dispatcher = MainThreadDispatcher::new();
    let workers: Vec<_> = (0..16usize)
        .map(|i| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || dispatcher.dispatch_sync(move || i * 2))
        })
        .collect();

    pump_until_finished(&dispatcher, &workers);

    let mut results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    results.sort_unstable();
    assert_eq!(results, (0..16).map(|i| i * 2).collect::<Vec<_>>());
    assert_eq!(dispatcher.stats().sync_executed, 16);
}

/// Known hazard: nobody drains, nobody returns. Guarded by discipline, not code.
#[test]
fn test_sync_submitter_blocks_while_designated_thread_is_idle() {
    let dispatcher = MainThreadDispatcher::new();

    let worker = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || dispatcher.dispatch_sync(|| ()))
    };

    wait_for(|| dispatcher.sync_queue_size() == 1);
    thread::sleep(Duration::from_millis(30));
    assert!(!worker.is_finished());

    // Resume draining so the test does not leak a blocked thread.
    pump_until_finished(&dispatcher, std::slice::from_ref(&worker));
    worker.join().unwrap();
}

// ============================================================================
// EMPTY WORK
// ============================================================================

#[test]
fn test_none_tasks_leave_queues_untouched() {
    let dispatcher = MainThreadDispatcher::new();
    dispatcher.dispatch(|| {});
    let before = dispatcher.queue_size();

    dispatcher.dispatch_task(None);
    dispatcher.dispatch_sync_task(None);

    assert_eq!(dispatcher.queue_size(), before);
    assert_eq!(dispatcher.sync_queue_size(), 0);
}

#[test]
fn test_none_sync_task_from_worker_returns_immediately() {
    let dispatcher = MainThreadDispatcher::new();

    let worker = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || dispatcher.dispatch_sync_task(None))
    };

    // No drain: a queued item would block forever.
    worker.join().unwrap();
    assert_eq!(dispatcher.sync_queue_size(), 0);
}

// ============================================================================
// INDEPENDENT QUEUES
// ============================================================================

#[test]
fn test_async_dispatch_not_blocked_by_inflight_sync() {
    let dispatcher = MainThreadDispatcher::new();

    let sync_worker = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || dispatcher.dispatch_sync(|| 1))
    };
    wait_for(|| dispatcher.sync_queue_size() == 1);

    let async_worker = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || {
            let start = Instant::now();
            dispatcher.dispatch(|| {});
            start.elapsed()
        })
    };
    let took = async_worker.join().unwrap();

    assert!(took < Duration::from_secs(1));
    assert_eq!(dispatcher.queue_size(), 1);
    assert!(!sync_worker.is_finished());

    let report = dispatcher.process_queue();
    assert_eq!(report.async_executed, 1);
    assert_eq!(report.sync_executed, 1);
    assert_eq!(sync_worker.join().unwrap(), 1);
}

// ============================================================================
// SNAPSHOT DRAINS
// ============================================================================

#[test]
fn test_work_submitted_during_drain_is_deferred() {
    let dispatcher = MainThreadDispatcher::new();
    let executed = Arc::new(AtomicUsize::new(0));

    // Each task re-dispatches one follow-up: a drain-until-empty policy
    // would never terminate here.
    fn chain(dispatcher: &Arc<MainThreadDispatcher>, executed: &Arc<AtomicUsize>) {
        let next_dispatcher = Arc::clone(dispatcher);
        let next_executed = Arc::clone(executed);
        dispatcher.dispatch(move || {
            next_executed.fetch_add(1, Ordering::SeqCst);
            chain(&next_dispatcher, &next_executed);
        });
    }
    chain(&dispatcher, &executed);

    for tick in 1..=5 {
        let report = dispatcher.process_queue();
        assert_eq!(report.async_executed, 1);
        assert_eq!(executed.load(Ordering::SeqCst), tick);
        assert_eq!(dispatcher.queue_size(), 1);
    }

    dispatcher.clear_queue();
}

#[test]
fn test_async_batch_runs_before_sync_batch() {
    let dispatcher = MainThreadDispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let sync_worker = {
        let dispatcher = Arc::clone(&dispatcher);
        let log = Arc::clone(&log);
        thread::spawn(move || dispatcher.dispatch_sync(move || log.lock().push("sync")))
    };
    wait_for(|| dispatcher.sync_queue_size() == 1);

    let async_log = Arc::clone(&log);
    dispatcher.dispatch(move || async_log.lock().push("async"));

    dispatcher.process_queue();
    sync_worker.join().unwrap();

    assert_eq!(*log.lock(), vec!["async", "sync"]);
}
