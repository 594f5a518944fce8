//! # Render Device
//!
//! Bundles the dispatcher, the native backend and the teardown policy.
//! Cheap to clone; every resource handle keeps one.
//!
//! ## Teardown Modes
//!
//! ```text
//! Deferred (normal frames):  drop → dispatch()       → freed on next drain
//! Blocking (shutdown):       drop → dispatch_sync()  → freed before drop returns
//! ```
//!
//! Switch to `Blocking` with [`RenderDevice::begin_shutdown`] once the run loop
//! is about to stop draining regularly, so native objects are really gone
//! before the process considers teardown complete.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tether_core::MainThreadDispatcher;

use crate::backend::GlBackend;

/// How dropped handles hand their native object back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeardownMode {
    /// Fire-and-forget: destroy on the next drain.
    Deferred,
    /// Block the dropping thread until the destroy call ran.
    Blocking,
}

struct DeviceShared {
    dispatcher: Arc<MainThreadDispatcher>,
    backend: Arc<dyn GlBackend>,
    blocking_teardown: AtomicBool,
}

/// Shared access to a thread-confined backend.
#[derive(Clone)]
pub struct RenderDevice {
    inner: Arc<DeviceShared>,
}

impl RenderDevice {
    /// Creates a device in [`TeardownMode::Deferred`].
    ///
    /// `backend` must be bound to the dispatcher's designated thread.
    #[must_use]
    pub fn new<B: GlBackend>(dispatcher: Arc<MainThreadDispatcher>, backend: Arc<B>) -> Self {
        let backend: Arc<dyn GlBackend> = backend;
        Self {
            inner: Arc::new(DeviceShared {
                dispatcher,
                backend,
                blocking_teardown: AtomicBool::new(false),
            }),
        }
    }

    /// The dispatcher routing native calls.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<MainThreadDispatcher> {
        &self.inner.dispatcher
    }

    /// The native backend. Only call into it on the designated thread.
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn GlBackend> {
        &self.inner.backend
    }

    /// Current teardown mode.
    #[inline]
    #[must_use]
    pub fn teardown_mode(&self) -> TeardownMode {
        if self.inner.blocking_teardown.load(Ordering::Acquire) {
            TeardownMode::Blocking
        } else {
            TeardownMode::Deferred
        }
    }

    /// Switches every handle of this device to blocking teardown.
    pub fn begin_shutdown(&self) {
        let was_blocking = self.inner.blocking_teardown.swap(true, Ordering::AcqRel);
        if !was_blocking {
            tracing::info!("render device switched to blocking teardown");
        }
    }

    /// Queues `work` against the backend on the designated thread.
    pub fn run_deferred<F>(&self, work: F)
    where
        F: FnOnce(&dyn GlBackend) + Send + 'static,
    {
        let backend = Arc::clone(&self.inner.backend);
        self.inner.dispatcher.dispatch(move || work(backend.as_ref()));
    }

    /// Runs `work` against the backend on the designated thread and returns its output.
    ///
    /// Inline on the designated thread, blocking everywhere else.
    pub fn run_blocking<F, R>(&self, work: F) -> R
    where
        F: FnOnce(&dyn GlBackend) -> R + Send + 'static,
        R: Send + 'static,
    {
        let backend = Arc::clone(&self.inner.backend);
        self.inner.dispatcher.dispatch_sync(move || work(backend.as_ref()))
    }
}

impl fmt::Debug for RenderDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderDevice")
            .field("dispatcher", &self.inner.dispatcher)
            .field("teardown", &self.teardown_mode())
            .finish_non_exhaustive()
    }
}
