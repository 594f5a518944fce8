//! # Native Backend Seam
//!
//! The OpenGL-style entry points the resource layer needs. Implementations
//! are bound to one thread; every method must only be called there, which in
//! practice means from inside a closure handed to the dispatcher.
//!
//! The trait is object safe and `Send + Sync` so the backend can ride inside
//! dispatched closures as an `Arc<dyn GlBackend>`.

mod headless;

pub use headless::HeadlessBackend;

use crate::error::RenderResult;
use crate::format::ShaderStage;
use crate::handle::{NativeId, ResourceKind};
use crate::resources::{BufferDesc, FramebufferDesc, TextureDesc};

/// Thread-confined native graphics calls.
pub trait GlBackend: Send + Sync + 'static {
    /// `glGenBuffers` + `glBufferData`.
    fn create_buffer(&self, desc: &BufferDesc) -> RenderResult<NativeId>;

    /// `glBufferSubData`.
    fn update_buffer(&self, id: NativeId, offset: usize, data: &[u8]) -> RenderResult<()>;

    /// `glGenTextures` + `glTexImage2D`.
    fn create_texture(&self, desc: &TextureDesc) -> RenderResult<NativeId>;

    /// `glTexSubImage2D` over the whole image.
    fn upload_texture(&self, id: NativeId, data: &[u8]) -> RenderResult<()>;

    /// `glCreateShader` + `glShaderSource` + `glCompileShader`.
    fn create_shader(&self, stage: ShaderStage, source: &str) -> RenderResult<NativeId>;

    /// Replaces the source of an existing shader and recompiles it.
    fn compile_shader(&self, id: NativeId, source: &str) -> RenderResult<()>;

    /// `glGenFramebuffers` + attachments + completeness check.
    fn create_framebuffer(&self, desc: &FramebufferDesc) -> RenderResult<NativeId>;

    /// `glCreateProgram` + attach + `glLinkProgram`.
    fn create_pipeline(&self, vertex: NativeId, fragment: NativeId) -> RenderResult<NativeId>;

    /// `glUseProgram`.
    fn bind_pipeline(&self, id: NativeId) -> RenderResult<()>;

    /// The matching `glDelete*` call.
    fn delete(&self, kind: ResourceKind, id: NativeId) -> RenderResult<()>;

    /// Number of native objects currently alive.
    fn live_objects(&self) -> usize;
}
