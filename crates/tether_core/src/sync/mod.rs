//! # Main-Thread Affinity
//!
//! Native graphics contexts accept calls from exactly one thread. Everything
//! else in the application runs wherever it likes.
//!
//! ## The Problem
//!
//! ```text
//! Worker thread:      glDeleteBuffers(id)   → UNDEFINED BEHAVIOUR
//! Designated thread:  glDeleteBuffers(id)   → OK
//! ```
//!
//! ## The Solution: Route, Don't Touch
//!
//! ```text
//! Worker:             dispatcher.dispatch(move || gl.delete(id))
//! Designated thread:  dispatcher.process_queue()   // once per frame
//! ```
//!
//! `dispatch` is fire-and-forget. `dispatch_sync` blocks the worker on a
//! [`SyncWorkItem`] until the designated thread has run the closure.

mod dispatcher;
mod work_item;

pub use dispatcher::{DispatcherStats, DrainReport, MainThreadDispatcher, Task};
pub use work_item::SyncWorkItem;
