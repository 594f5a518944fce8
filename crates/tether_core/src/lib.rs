//! # TETHER Core
//!
//! Main-thread affinity dispatcher designed for:
//! - OpenGL-style backends whose context is bound to one thread
//! - Worker threads that create, update and drop GPU resources freely
//! - A run loop that drains submitted work once per frame
//!
//! ## Architecture Rules
//!
//! 1. **One consumer** - the designated thread is captured at construction
//!    and never changes
//! 2. **No reordering** - each queue is FIFO, nothing is prioritized,
//!    coalesced or cancelled
//! 3. **No locks across user code** - queues are swapped out, then executed
//!
//! ## Example
//!
//! ```rust
//! use tether_core::MainThreadDispatcher;
//!
//! let dispatcher = MainThreadDispatcher::new();
//! dispatcher.dispatch(|| println!("runs on the designated thread"));
//! assert_eq!(dispatcher.queue_size(), 1);
//!
//! let report = dispatcher.process_queue();
//! assert_eq!(report.async_executed, 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod sync;

pub use sync::{DispatcherStats, DrainReport, MainThreadDispatcher, SyncWorkItem, Task};
