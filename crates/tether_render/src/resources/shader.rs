//! Shader stages.

use crate::device::RenderDevice;
use crate::error::RenderResult;
use crate::format::ShaderStage;
use crate::handle::{NativeId, ResourceHandle, ResourceKind};

use super::invalid;

/// Compiled shader stage living on the designated thread.
#[derive(Debug)]
pub struct Shader {
    handle: ResourceHandle,
    stage: ShaderStage,
}

impl Shader {
    /// Creates and compiles a shader.
    ///
    /// # Errors
    ///
    /// Empty sources are rejected before dispatch. Compile failures come back
    /// as [`Native`](crate::RenderError::Native) carrying the info log.
    pub fn new(device: &RenderDevice, stage: ShaderStage, source: &str) -> RenderResult<Self> {
        if source.trim().is_empty() {
            return Err(invalid("shader source is empty"));
        }

        let source = source.to_owned();
        let id = device.run_blocking(move |gl| gl.create_shader(stage, &source))?;
        tracing::debug!(id = id.get(), ?stage, "shader compiled");

        Ok(Self {
            handle: ResourceHandle::new(device, ResourceKind::Shader, id),
            stage,
        })
    }

    /// Replaces the source and recompiles in place.
    ///
    /// # Errors
    ///
    /// On compile failure the previous program text stays active.
    pub fn recompile(&self, source: &str) -> RenderResult<()> {
        let id = self.handle.live_id()?;
        if source.trim().is_empty() {
            return Err(invalid("shader source is empty"));
        }

        let source = source.to_owned();
        self.handle
            .device()
            .run_blocking(move |gl| gl.compile_shader(id, &source))
    }

    /// Pipeline stage.
    #[inline]
    #[must_use]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Native id while live.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<NativeId> {
        self.handle.id()
    }

    /// The underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    /// Submits the native destroy now.
    pub fn release(&mut self) -> bool {
        self.handle.release()
    }
}
