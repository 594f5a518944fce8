//! 2D textures.

use crate::device::RenderDevice;
use crate::error::RenderResult;
use crate::format::TextureFormat;
use crate::handle::{NativeId, ResourceHandle, ResourceKind};

use super::invalid;

/// Largest width or height accepted.
pub const MAX_TEXTURE_SIZE: u32 = 16_384;

/// Texture build parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Texel format.
    pub format: TextureFormat,
    /// Full image contents, tightly packed. Zero-filled when `None`.
    pub data: Option<Vec<u8>>,
}

impl TextureDesc {
    /// Empty texture.
    #[must_use]
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: None,
        }
    }

    /// Size of the full image in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!("texture extent {}x{} is empty", self.width, self.height)));
        }
        if self.width > MAX_TEXTURE_SIZE || self.height > MAX_TEXTURE_SIZE {
            return Err(invalid(format!(
                "texture extent {}x{} exceeds {MAX_TEXTURE_SIZE}",
                self.width, self.height
            )));
        }
        if let Some(data) = &self.data {
            if data.len() != self.byte_len() {
                return Err(invalid(format!(
                    "texture data is {} bytes, expected {}",
                    data.len(),
                    self.byte_len()
                )));
            }
        }
        Ok(())
    }
}

/// 2D texture living on the designated thread.
#[derive(Debug)]
pub struct Texture {
    handle: ResourceHandle,
    width: u32,
    height: u32,
    format: TextureFormat,
}

impl Texture {
    /// Creates the texture. Blocks until the designated thread ran the native call.
    ///
    /// # Errors
    ///
    /// Descriptor errors are reported before dispatch; native failures after.
    pub fn new(device: &RenderDevice, desc: TextureDesc) -> RenderResult<Self> {
        desc.validate()?;
        let (width, height, format) = (desc.width, desc.height, desc.format);

        let id = device.run_blocking(move |gl| gl.create_texture(&desc))?;
        tracing::debug!(id = id.get(), width, height, ?format, "texture created");

        Ok(Self {
            handle: ResourceHandle::new(device, ResourceKind::Texture, id),
            width,
            height,
            format,
        })
    }

    /// Replaces the whole image.
    ///
    /// # Errors
    ///
    /// `data` must be exactly `width * height * bytes_per_pixel` bytes.
    pub fn upload(&self, data: &[u8]) -> RenderResult<()> {
        let id = self.handle.live_id()?;
        let expected = self.byte_len();
        if data.len() != expected {
            return Err(invalid(format!("upload is {} bytes, expected {expected}", data.len())));
        }

        let texels = data.to_vec();
        self.handle
            .device()
            .run_blocking(move |gl| gl.upload_texture(id, &texels))
    }

    /// Width in texels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel format.
    #[inline]
    #[must_use]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Size of the full image in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
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
    fn test_create_empty_texture() {
        let (device, backend) = device();
        let texture = Texture::new(&device, TextureDesc::new(4, 2, TextureFormat::Rgba8)).unwrap();

        assert_eq!(texture.byte_len(), 32);
        assert_eq!(backend.texture_contents(texture.id().unwrap()), Some(vec![0; 32]));
    }

    #[test]
    fn test_extent_validation() {
        let (device, backend) = device();
        assert!(Texture::new(&device, TextureDesc::new(0, 8, TextureFormat::R8)).is_err());
        assert!(Texture::new(&device, TextureDesc::new(MAX_TEXTURE_SIZE + 1, 1, TextureFormat::R8)).is_err());
        assert_eq!(backend.created(ResourceKind::Texture), 0);
    }

    #[test]
    fn test_data_length_must_match() {
        let (device, _backend) = device();
        let mut desc = TextureDesc::new(2, 2, TextureFormat::Rg8);
        desc.data = Some(vec![0; 7]);
        assert!(matches!(Texture::new(&device, desc), Err(RenderError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_upload_replaces_image() {
        let (device, backend) = device();
        let texture = Texture::new(&device, TextureDesc::new(2, 1, TextureFormat::R8)).unwrap();

        texture.upload(&[7, 8]).unwrap();
        assert_eq!(backend.texture_contents(texture.id().unwrap()), Some(vec![7, 8]));
        assert!(texture.upload(&[1]).is_err());
    }
}
