//! Vertex, index, uniform and storage buffers.

use crate::device::RenderDevice;
use crate::error::RenderResult;
use crate::format::BufferUsage;
use crate::handle::{NativeId, ResourceHandle, ResourceKind};

use super::invalid;

/// Largest buffer accepted, in bytes (1 GiB).
pub const MAX_BUFFER_SIZE: usize = 1 << 30;

/// Buffer build parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    /// Size in bytes. Must be non-zero.
    pub size: usize,
    /// Binding target.
    pub usage: BufferUsage,
    /// Optional contents for the start of the buffer. Must fit in `size`.
    pub initial_data: Option<Vec<u8>>,
}

impl BufferDesc {
    /// Zero-filled buffer of `size` bytes.
    #[must_use]
    pub fn new(size: usize, usage: BufferUsage) -> Self {
        Self {
            size,
            usage,
            initial_data: None,
        }
    }

    /// Buffer sized to and filled with `data`.
    #[must_use]
    pub fn with_data(usage: BufferUsage, data: Vec<u8>) -> Self {
        Self {
            size: data.len(),
            usage,
            initial_data: Some(data),
        }
    }

    fn validate(&self) -> RenderResult<()> {
        if self.size == 0 {
            return Err(invalid("buffer size must be non-zero"));
        }
        if self.size > MAX_BUFFER_SIZE {
            return Err(invalid(format!(
                "buffer size {} exceeds {MAX_BUFFER_SIZE}",
                self.size
            )));
        }
        if let Some(data) = &self.initial_data {
            if data.len() > self.size {
                return Err(invalid(format!(
                    "initial data of {} bytes exceeds buffer size {}",
                    data.len(),
                    self.size
                )));
            }
        }
        Ok(())
    }
}

/// GPU buffer owned by the calling code, living on the designated thread.
#[derive(Debug)]
pub struct Buffer {
    handle: ResourceHandle,
    size: usize,
    usage: BufferUsage,
}

impl Buffer {
    /// Creates the buffer. Blocks until the designated thread ran the native call.
    ///
    /// # Errors
    ///
    /// [`InvalidDescriptor`](crate::RenderError::InvalidDescriptor) before any
    /// dispatch, or [`Native`](crate::RenderError::Native) if creation failed.
    pub fn new(device: &RenderDevice, desc: BufferDesc) -> RenderResult<Self> {
        desc.validate()?;
        let (size, usage) = (desc.size, desc.usage);

        let id = device.run_blocking(move |gl| gl.create_buffer(&desc))?;
        tracing::debug!(id = id.get(), size, ?usage, "buffer created");

        Ok(Self {
            handle: ResourceHandle::new(device, ResourceKind::Buffer, id),
            size,
            usage,
        })
    }

    /// Overwrites `data.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Out-of-range writes are rejected before dispatch. Fails with
    /// [`Released`](crate::RenderError::Released) after `release`.
    pub fn update(&self, offset: usize, data: &[u8]) -> RenderResult<()> {
        let id = self.handle.live_id()?;
        let in_range = offset
            .checked_add(data.len())
            .is_some_and(|end| end <= self.size);
        if !in_range {
            return Err(invalid(format!(
                "write of {} bytes at offset {offset} exceeds buffer size {}",
                data.len(),
                self.size
            )));
        }

        let bytes = data.to_vec();
        self.handle
            .device()
            .run_blocking(move |gl| gl.update_buffer(id, offset, &bytes))
    }

    /// Size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Binding target.
    #[inline]
    #[must_use]
    pub fn usage(&self) -> BufferUsage {
        self.usage
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

    /// Submits the native destroy now. See [`ResourceHandle::release`].
    pub fn release(&mut self) -> bool {
        self.handle.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::RenderError;
    use std::sync::Arc;
    use tether_core::MainThreadDispatcher;

    fn device() -> (RenderDevice, Arc<HeadlessBackend>) {
        let backend = Arc::new(HeadlessBackend::new());
        (RenderDevice::new(MainThreadDispatcher::new(), Arc::clone(&backend)), backend)
    }

    #[test]
    fn test_create_with_initial_data() {
        let (device, backend) = device();
        let buffer = Buffer::new(&device, BufferDesc::with_data(BufferUsage::Index, vec![1, 2, 3, 4])).unwrap();

        assert_eq!(buffer.size(), 4);
        assert_eq!(buffer.usage(), BufferUsage::Index);
        assert_eq!(backend.buffer_contents(buffer.id().unwrap()), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_zero_size_rejected() {
        let (device, backend) = device();
        let result = Buffer::new(&device, BufferDesc::new(0, BufferUsage::Vertex));

        assert!(matches!(result, Err(RenderError::InvalidDescriptor(_))));
        assert_eq!(backend.created(ResourceKind::Buffer), 0);
    }

    #[test]
    fn test_size_above_limit_rejected_before_dispatch() {
        let (device, backend) = device();

        for size in [MAX_BUFFER_SIZE + 1, usize::MAX] {
            let result = Buffer::new(&device, BufferDesc::new(size, BufferUsage::Vertex));
            assert!(matches!(result, Err(RenderError::InvalidDescriptor(_))));
        }
        assert_eq!(device.dispatcher().stats().sync_inline, 0);
        assert_eq!(backend.created(ResourceKind::Buffer), 0);
    }

    #[test]
    fn test_oversized_initial_data_rejected() {
        let (device, _backend) = device();
        let desc = BufferDesc {
            size: 2,
            usage: BufferUsage::Uniform,
            initial_data: Some(vec![0; 3]),
        };
        assert!(Buffer::new(&device, desc).is_err());
    }

    #[test]
    fn test_update_in_and_out_of_range() {
        let (device, backend) = device();
        let buffer = Buffer::new(&device, BufferDesc::new(8, BufferUsage::Storage)).unwrap();

        buffer.update(4, &[9, 9, 9, 9]).unwrap();
        assert_eq!(backend.buffer_contents(buffer.id().unwrap()), Some(vec![0, 0, 0, 0, 9, 9, 9, 9]));

        assert!(matches!(buffer.update(6, &[1, 1, 1]), Err(RenderError::InvalidDescriptor(_))));
        assert!(buffer.update(usize::MAX, &[1]).is_err());
    }

    #[test]
    fn test_update_after_release() {
        let (device, _backend) = device();
        let mut buffer = Buffer::new(&device, BufferDesc::new(8, BufferUsage::Vertex)).unwrap();
        assert!(buffer.release());
        assert_eq!(buffer.update(0, &[1]), Err(RenderError::Released(ResourceKind::Buffer)));
    }
}
