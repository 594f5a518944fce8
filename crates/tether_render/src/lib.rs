//! # TETHER Render
//!
//! Thread-confined resource handles on top of [`tether_core`]:
//! - Native objects are created, mutated and destroyed on the designated thread
//! - Rust-side handles move and drop freely on any thread
//! - Teardown is routed through the dispatcher, never run in place
//!
//! ## Architecture Rules
//!
//! 1. **Validate first** - descriptors are checked on the calling thread;
//!    nothing is dispatched for a bad request
//! 2. **Create blocking** - the caller needs the native id, so creation and
//!    mutation go through `dispatch_sync`
//! 3. **Destroy deferred** - drops use `dispatch`, except after
//!    [`RenderDevice::begin_shutdown`], where they block until freed
//! 4. **Release once** - a handle clears its id before submitting the
//!    destroy call, so repeated teardown is a no-op
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tether_core::MainThreadDispatcher;
//! use tether_render::{Buffer, BufferDesc, BufferUsage, HeadlessBackend, RenderDevice, ResourceKind};
//!
//! let backend = Arc::new(HeadlessBackend::new());
//! let device = RenderDevice::new(MainThreadDispatcher::new(), Arc::clone(&backend));
//!
//! let buffer = Buffer::new(&device, BufferDesc::new(256, BufferUsage::Vertex)).unwrap();
//! drop(buffer);
//! assert_eq!(backend.deleted(ResourceKind::Buffer), 0);
//!
//! device.dispatcher().process_queue();
//! assert_eq!(backend.deleted(ResourceKind::Buffer), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod device;
pub mod error;
pub mod format;
pub mod handle;
pub mod resources;

pub use backend::{GlBackend, HeadlessBackend};
pub use device::{RenderDevice, TeardownMode};
pub use error::{RenderError, RenderResult};
pub use format::{BufferUsage, GlFormat, ShaderStage, TextureFormat};
pub use handle::{NativeId, ResourceHandle, ResourceKind};
pub use resources::{
    Buffer, BufferDesc, Framebuffer, FramebufferDesc, Pipeline, Shader, Texture, TextureDesc,
    MAX_BUFFER_SIZE, MAX_COLOR_ATTACHMENTS, MAX_TEXTURE_SIZE,
};
