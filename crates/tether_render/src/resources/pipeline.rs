//! Linked vertex + fragment programs.

use crate::device::RenderDevice;
use crate::error::RenderResult;
use crate::format::ShaderStage;
use crate::handle::{NativeId, ResourceHandle, ResourceKind};

use super::{invalid, Shader};

/// Linked program living on the designated thread.
///
/// Shaders may be released once the pipeline is linked.
#[derive(Debug)]
pub struct Pipeline {
    handle: ResourceHandle,
}

impl Pipeline {
    /// Links a vertex and a fragment shader.
    ///
    /// # Errors
    ///
    /// Wrong stages are rejected before dispatch; a released shader yields
    /// [`Released`](crate::RenderError::Released).
    pub fn new(device: &RenderDevice, vertex: &Shader, fragment: &Shader) -> RenderResult<Self> {
        if vertex.stage() != ShaderStage::Vertex {
            return Err(invalid(format!("expected a vertex shader, got {:?}", vertex.stage())));
        }
        if fragment.stage() != ShaderStage::Fragment {
            return Err(invalid(format!("expected a fragment shader, got {:?}", fragment.stage())));
        }
        let vs = vertex.handle().live_id()?;
        let fs = fragment.handle().live_id()?;

        let id = device.run_blocking(move |gl| gl.create_pipeline(vs, fs))?;
        tracing::debug!(id = id.get(), vs = vs.get(), fs = fs.get(), "pipeline linked");

        Ok(Self {
            handle: ResourceHandle::new(device, ResourceKind::Pipeline, id),
        })
    }

    /// Makes this the active program.
    ///
    /// # Errors
    ///
    /// Fails with `Released` after `release`.
    pub fn bind(&self) -> RenderResult<()> {
        let id = self.handle.live_id()?;
        self.handle.device().run_blocking(move |gl| gl.bind_pipeline(id))
    }

    /// Native id while live.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<NativeId> {
        self.handle.id()
    }

    /// Submits the native destroy now.
    pub fn release(&mut self) -> bool {
        self.handle.release()
    }
}
