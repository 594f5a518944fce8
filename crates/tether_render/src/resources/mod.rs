//! # Thread-Confined Resources
//!
//! Typed wrappers over [`ResourceHandle`](crate::ResourceHandle). Each one:
//!
//! 1. validates its descriptor on the calling thread (no dispatch on failure)
//! 2. runs the native create call through `dispatch_sync`
//! 3. owns the resulting handle, whose drop queues the native destroy
//!
//! Mutations (`update`, `upload`, `recompile`, `bind`) are blocking calls
//! so errors reach the caller.

mod buffer;
mod framebuffer;
mod pipeline;
mod shader;
mod texture;

pub use buffer::{Buffer, BufferDesc, MAX_BUFFER_SIZE};
pub use framebuffer::{Framebuffer, FramebufferDesc, MAX_COLOR_ATTACHMENTS};
pub use pipeline::Pipeline;
pub use shader::Shader;
pub use texture::{Texture, TextureDesc, MAX_TEXTURE_SIZE};

use crate::error::RenderError;

/// Shorthand for a calling-thread validation failure.
fn invalid(message: impl Into<String>) -> RenderError {
    RenderError::InvalidDescriptor(message.into())
}
