//! # Sync Work Item
//!
//! The rendezvous object exchanged between a blocked submitter and the
//! designated thread.
//!
//! ```text
//!   Pending ──(designated thread runs closure)──► Completed
//! ```
//!
//! One-way, no cancellation. The closure is written once by the submitter
//! and taken once by the consumer.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::dispatcher::Task;

/// A closure paired with a completion flag.
///
/// Shared through an `Arc` between the submitting thread and the dispatcher,
/// so the item outlives the submitting call frame if the consumer is slow.
pub struct SyncWorkItem {
    /// Work to run. `None` once the consumer has taken it.
    closure: Mutex<Option<Task>>,
    /// Set by the consumer (release) after the closure returns.
    completed: AtomicBool,
}

impl SyncWorkItem {
    /// Creates a pending item wrapping `task`.
    pub(crate) fn new(task: Task) -> Self {
        Self {
            closure: Mutex::new(Some(task)),
            completed: AtomicBool::new(false),
        }
    }

    /// Runs the closure and marks the item completed.
    ///
    /// Called only by the designated thread while draining. Running an item
    /// twice is a no-op the second time.
    pub(crate) fn run(&self) {
        // Release the closure lock before running user code.
        let task = self.closure.lock().take();
        if let Some(task) = task {
            task();
            self.completed.store(true, Ordering::Release);
        }
    }

    /// Returns true once the designated thread has finished running the closure.
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SyncWorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncWorkItem")
            .field("completed", &self.is_completed())
            .finish_non_exhaustive()
    }
}
