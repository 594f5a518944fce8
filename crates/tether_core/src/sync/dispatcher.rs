//! # Main-Thread Dispatcher
//!
//! Lets any thread submit work that must run on the one designated thread.
//!
//! ## Architecture
//!
//! ```text
//!   Worker A ──dispatch()──────► ┌──────────────┐
//!   Worker B ──dispatch()──────► │ async queue  │──┐
//!                                └──────────────┘  │  process_queue()
//!                                                  ├──────────────────► designated thread
//!                                ┌──────────────┐  │  (once per frame)
//!   Worker C ──dispatch_sync()─► │ sync queue   │──┘
//!        ▲                       └──────────────┘
//!        └──── blocked on condvar until its item completes
//! ```
//!
//! ## Rules
//!
//! - Two queues, two locks. Async submissions never wait behind sync
//!   submissions and vice versa.
//! - Locks are held only to push or to swap a queue out. Never while user
//!   closures execute.
//! - A drain works on snapshots. Work submitted while a drain is running
//!   lands in the next `process_queue` call.
//! - `dispatch_sync` on the designated thread runs inline (no self-deadlock).
//!
//! ## Liveness
//!
//! The designated thread must keep calling [`MainThreadDispatcher::process_queue`]
//! (typically once per frame) for as long as anyone may call `dispatch_sync`.
//! A dispatcher that stops draining strands every blocked submitter forever.
//! This is not detected.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use super::work_item::SyncWorkItem;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Counts from a single [`MainThreadDispatcher::process_queue`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Async tasks executed in this drain.
    pub async_executed: usize,
    /// Sync items executed (and completed) in this drain.
    pub sync_executed: usize,
}

impl DrainReport {
    /// Returns true if the drain found nothing to do.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.async_executed == 0 && self.sync_executed == 0
    }

    /// Total work items executed.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> usize {
        self.async_executed + self.sync_executed
    }
}

/// Snapshot of the dispatcher's lifetime counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Async tasks accepted by `dispatch`.
    pub async_submitted: u64,
    /// Sync items queued by `dispatch_sync` from other threads.
    pub sync_submitted: u64,
    /// `dispatch_sync` calls that ran inline on the designated thread.
    pub sync_inline: u64,
    /// Async tasks executed by `process_queue`.
    pub async_executed: u64,
    /// Sync items executed by `process_queue`.
    pub sync_executed: u64,
    /// Number of `process_queue` calls.
    pub drains: u64,
    /// Async tasks thrown away by `clear_queue`.
    pub discarded: u64,
}

/// Lifetime counters. Relaxed ordering: diagnostics only.
#[derive(Default)]
struct StatCounters {
    async_submitted: AtomicU64,
    sync_submitted: AtomicU64,
    sync_inline: AtomicU64,
    async_executed: AtomicU64,
    sync_executed: AtomicU64,
    drains: AtomicU64,
    discarded: AtomicU64,
}

impl StatCounters {
    #[inline]
    fn bump(counter: &AtomicU64, by: usize) {
        counter.fetch_add(by as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DispatcherStats {
        DispatcherStats {
            async_submitted: self.async_submitted.load(Ordering::Relaxed),
            sync_submitted: self.sync_submitted.load(Ordering::Relaxed),
            sync_inline: self.sync_inline.load(Ordering::Relaxed),
            async_executed: self.async_executed.load(Ordering::Relaxed),
            sync_executed: self.sync_executed.load(Ordering::Relaxed),
            drains: self.drains.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Routes work from any thread onto the designated thread.
///
/// Created once per thread-confined subsystem, on the thread that owns the
/// native context, and shared by `Arc`. It is deliberately not `Clone`:
/// thread identity and the synchronization primitives are not transferable.
///
/// ## Usage
///
/// ```rust
/// use std::sync::Arc;
/// use tether_core::MainThreadDispatcher;
///
/// // On the thread that owns the native context:
/// let dispatcher = MainThreadDispatcher::new();
///
/// let worker = {
///     let dispatcher = Arc::clone(&dispatcher);
///     std::thread::spawn(move || dispatcher.dispatch_sync(|| 6 * 7))
/// };
///
/// // Run loop: drain once per frame until the worker has its answer.
/// while !worker.is_finished() {
///     dispatcher.process_queue();
///     std::thread::yield_now();
/// }
/// assert_eq!(worker.join().unwrap(), 42);
/// ```
pub struct MainThreadDispatcher {
    /// The only thread allowed to drain. Fixed at construction.
    designated: ThreadId,
    /// Fire-and-forget work, FIFO.
    async_queue: Mutex<Vec<Task>>,
    /// Blocking work, FIFO. Also the mutex paired with `sync_completed`.
    sync_queue: Mutex<Vec<Arc<SyncWorkItem>>>,
    /// Broadcast once per drained sync batch.
    sync_completed: Condvar,
    /// Lifetime counters.
    stats: StatCounters,
}

impl MainThreadDispatcher {
    /// Creates a dispatcher whose designated thread is the calling thread.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let designated = thread::current().id();
        tracing::debug!(?designated, "main-thread dispatcher created");

        Arc::new(Self {
            designated,
            async_queue: Mutex::new(Vec::new()),
            sync_queue: Mutex::new(Vec::new()),
            sync_completed: Condvar::new(),
            stats: StatCounters::default(),
        })
    }

    /// Returns the identity of the designated thread.
    #[inline]
    #[must_use]
    pub fn designated_thread(&self) -> ThreadId {
        self.designated
    }

    /// Returns true if the caller is the designated thread.
    #[inline]
    #[must_use]
    pub fn is_designated_thread(&self) -> bool {
        thread::current().id() == self.designated
    }

    /// Queues `work` to run on the designated thread during the next drain.
    ///
    /// Returns immediately. Closures dispatched by one thread run in the order
    /// that thread submitted them.
    pub fn dispatch<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatch_task(Some(Box::new(work)));
    }

    /// Queues an already boxed task. `None` is silently ignored.
    pub fn dispatch_task(&self, task: Option<Task>) {
        let Some(task) = task else {
            return;
        };

        let queued = {
            let mut queue = self.async_queue.lock();
            queue.push(task);
            queue.len()
        };
        StatCounters::bump(&self.stats.async_submitted, 1);
        tracing::trace!(queued, "async task dispatched");
    }

    /// Runs `work` on the designated thread and returns its output.
    ///
    /// On the designated thread the closure runs inline, without touching
    /// any queue. Anywhere else the caller blocks until a `process_queue`
    /// call has executed the closure to completion.
    ///
    /// Errors produced by `work` travel back in `R`; the dispatcher itself
    /// never fails. It also never catches a panic raised by `work`.
    ///
    /// Calling this off the designated thread while holding a lock that the
    /// designated thread needs before its next drain deadlocks. Avoiding that
    /// is the caller's responsibility.
    pub fn dispatch_sync<F, R>(&self, work: F) -> R
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_designated_thread() {
            StatCounters::bump(&self.stats.sync_inline, 1);
            return work();
        }

        let slot = Arc::new(Mutex::new(None));
        let producer = Arc::clone(&slot);
        self.enqueue_sync_and_wait(Box::new(move || {
            *producer.lock() = Some(work());
        }));

        let result = slot.lock().take();
        match result {
            Some(value) => value,
            None => unreachable!("sync work item completed without producing a result"),
        }
    }

    /// Blocking submission of an already boxed task. `None` returns at once.
    pub fn dispatch_sync_task(&self, task: Option<Task>) {
        let Some(task) = task else {
            return;
        };

        if self.is_designated_thread() {
            StatCounters::bump(&self.stats.sync_inline, 1);
            task();
            return;
        }

        self.enqueue_sync_and_wait(task);
    }

    /// Pushes a sync item and waits on its own completion flag.
    ///
    /// The push and the first flag check happen under the same guard the
    /// condvar waits on, so a broadcast cannot slip in between them.
    fn enqueue_sync_and_wait(&self, task: Task) {
        let item = Arc::new(SyncWorkItem::new(task));
        StatCounters::bump(&self.stats.sync_submitted, 1);

        let mut queue = self.sync_queue.lock();
        queue.push(Arc::clone(&item));
        tracing::trace!(queued = queue.len(), "sync task dispatched, waiting");

        // Predicate is this item's flag, never "queue non-empty".
        while !item.is_completed() {
            self.sync_completed.wait(&mut queue);
        }
    }

    /// Drains both queues on the designated thread.
    ///
    /// 1. Swap out the async queue, run every task in FIFO order.
    /// 2. Swap out the sync queue, run every item in FIFO order, marking each
    ///    completed as soon as it returns.
    /// 3. Broadcast once to wake the blocked submitters.
    ///
    /// Work submitted while this runs is left for the next call.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if called from any thread other than the
    /// designated one. Release builds do not check.
    ///
    /// A panic raised by a closure propagates out of this call. The rest of
    /// the snapshot has already left its queue and is lost: later async tasks
    /// never run, and submitters of later sync items stay blocked even if
    /// draining continues afterwards.
    pub fn process_queue(&self) -> DrainReport {
        debug_assert!(
            self.is_designated_thread(),
            "process_queue must be called on the designated thread"
        );

        let tasks = std::mem::take(&mut *self.async_queue.lock());
        let async_executed = tasks.len();
        for task in tasks {
            task();
        }

        let items = std::mem::take(&mut *self.sync_queue.lock());
        let sync_executed = items.len();
        for item in &items {
            item.run();
        }

        if sync_executed > 0 {
            let _queue = self.sync_queue.lock();
            self.sync_completed.notify_all();
        }

        StatCounters::bump(&self.stats.drains, 1);
        StatCounters::bump(&self.stats.async_executed, async_executed);
        StatCounters::bump(&self.stats.sync_executed, sync_executed);

        let report = DrainReport {
            async_executed,
            sync_executed,
        };
        if !report.is_empty() {
            tracing::debug!(async_executed, sync_executed, "dispatcher queues drained");
        }
        report
    }

    /// Current async queue length. A snapshot, stale as soon as it returns.
    #[inline]
    #[must_use]
    pub fn queue_size(&self) -> usize {
        self.async_queue.lock().len()
    }

    /// Current sync queue length. A snapshot, stale as soon as it returns.
    #[inline]
    #[must_use]
    pub fn sync_queue_size(&self) -> usize {
        self.sync_queue.lock().len()
    }

    /// Discards all pending async work without running it.
    ///
    /// Meant for the designated thread during teardown, when abandoning the
    /// pending work is known to be safe. The sync queue is left alone: its
    /// submitters are blocked and would never wake up.
    ///
    /// Returns the number of discarded tasks.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if called from any thread other than the
    /// designated one.
    pub fn clear_queue(&self) -> usize {
        debug_assert!(
            self.is_designated_thread(),
            "clear_queue must be called on the designated thread"
        );

        let discarded = std::mem::take(&mut *self.async_queue.lock());
        let count = discarded.len();
        // Captured state is dropped here, outside the lock.
        drop(discarded);

        if count > 0 {
            StatCounters::bump(&self.stats.discarded, count);
            tracing::warn!(discarded = count, "pending async work discarded");
        }
        count
    }

    /// Returns the lifetime counters.
    #[must_use]
    pub fn stats(&self) -> DispatcherStats {
        self.stats.snapshot()
    }
}

impl fmt::Debug for MainThreadDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainThreadDispatcher")
            .field("designated", &self.designated)
            .field("queue_size", &self.queue_size())
            .field("sync_queue_size", &self.sync_queue_size())
            .finish_non_exhaustive()
    }
}
