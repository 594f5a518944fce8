//! # Native Handles
//!
//! The affine owner of a thread-confined native object.
//!
//! ```text
//!   Some(id) ──release()──► None          (destroy queued via dispatcher)
//!   None     ──release()──► None          (no-op, never a second submission)
//! ```
//!
//! `None` is the sentinel for "no resource owned". The stored id is cleared
//! *before* the destroy call is submitted, so a second teardown, a drop after
//! an explicit release, or any other repeat is guaranteed to do nothing.

use std::fmt;
use std::num::NonZeroU32;

use crate::device::{RenderDevice, TeardownMode};
use crate::error::{RenderError, RenderResult};

/// Opaque native object name, meaningful only on the designated thread.
///
/// Never zero: GL reserves name 0, which `Option<NativeId>` uses as its sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeId(NonZeroU32);

impl NativeId {
    /// Wraps a raw native name. Returns `None` for the reserved name 0.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns the raw native name.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kinds of thread-confined native objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResourceKind {
    /// Vertex, index, uniform or storage buffer.
    Buffer = 0,
    /// 2D texture.
    Texture = 1,
    /// Compiled shader stage.
    Shader = 2,
    /// Framebuffer object.
    Framebuffer = 3,
    /// Linked program.
    Pipeline = 4,
}

impl ResourceKind {
    /// Every kind, in index order.
    pub const ALL: [Self; 5] = [
        Self::Buffer,
        Self::Texture,
        Self::Shader,
        Self::Framebuffer,
        Self::Pipeline,
    ];

    /// Dense index for per-kind counters.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::Texture => "texture",
            Self::Shader => "shader",
            Self::Framebuffer => "framebuffer",
            Self::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sole owner of one native object.
///
/// Only the resource constructors build these, after the native create call
/// has run on the designated thread. The handle itself may move to and be
/// dropped on any thread: teardown always goes through the dispatcher.
pub struct ResourceHandle {
    kind: ResourceKind,
    id: Option<NativeId>,
    device: RenderDevice,
}

impl ResourceHandle {
    /// Takes ownership of a freshly created native object.
    pub(crate) fn new(device: &RenderDevice, kind: ResourceKind, id: NativeId) -> Self {
        Self {
            kind,
            id: Some(id),
            device: device.clone(),
        }
    }

    /// The kind of object owned.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The owned native id, or `None` once released.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<NativeId> {
        self.id
    }

    /// Returns true once the handle has been submitted for destruction.
    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.id.is_none()
    }

    /// The device this handle belongs to.
    #[inline]
    #[must_use]
    pub fn device(&self) -> &RenderDevice {
        &self.device
    }

    /// The owned id, or [`RenderError::Released`].
    pub(crate) fn live_id(&self) -> RenderResult<NativeId> {
        self.id.ok_or(RenderError::Released(self.kind))
    }

    /// Submits the native destroy call according to the device's teardown mode.
    ///
    /// Returns true if this call submitted the destruction, false if the
    /// handle was already released.
    pub fn release(&mut self) -> bool {
        match self.device.teardown_mode() {
            TeardownMode::Deferred => self.release_deferred(),
            TeardownMode::Blocking => self.release_sync(),
        }
    }

    /// Queues the destroy call and returns at once.
    pub fn release_deferred(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };
        let kind = self.kind;
        tracing::trace!(%kind, id = id.get(), "native destroy queued");

        self.device.run_deferred(move |gl| {
            if let Err(err) = gl.delete(kind, id) {
                tracing::warn!(%kind, id = id.get(), %err, "native destroy failed");
            }
        });
        true
    }

    /// Submits the destroy call and blocks until the designated thread ran it.
    pub fn release_sync(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };
        let kind = self.kind;
        tracing::trace!(%kind, id = id.get(), "native destroy (blocking)");

        let outcome = self.device.run_blocking(move |gl| gl.delete(kind, id));
        if let Err(err) = outcome {
            tracing::warn!(%kind, id = id.get(), %err, "native destroy failed");
        }
        true
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
