//! Framebuffer objects.
//!
//! A framebuffer references its attachments by native id but does not own
//! them. Dropping an attached texture first is allowed; the native side
//! simply detaches it.

use crate::device::RenderDevice;
use crate::error::RenderResult;
use crate::handle::{NativeId, ResourceHandle, ResourceKind};

use super::{invalid, Texture};

/// Most color attachments a framebuffer accepts.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Native-side framebuffer parameters, built by [`Framebuffer::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramebufferDesc {
    /// Shared attachment width.
    pub width: u32,
    /// Shared attachment height.
    pub height: u32,
    /// Color attachments, in attachment-point order.
    pub color: Vec<NativeId>,
    /// Optional depth(-stencil) attachment.
    pub depth: Option<NativeId>,
}

/// Render target living on the designated thread.
#[derive(Debug)]
pub struct Framebuffer {
    handle: ResourceHandle,
    width: u32,
    height: u32,
    color_attachments: usize,
    has_depth: bool,
}

impl Framebuffer {
    /// Creates a framebuffer over live textures.
    ///
    /// # Errors
    ///
    /// - no attachments, too many color attachments, mismatched sizes or a
    ///   color/depth format in the wrong slot: `InvalidDescriptor`
    /// - a released texture: `Released`
    /// - incomplete on the native side: `Native`
    pub fn new(device: &RenderDevice, color: &[&Texture], depth: Option<&Texture>) -> RenderResult<Self> {
        if color.len() > MAX_COLOR_ATTACHMENTS {
            return Err(invalid(format!(
                "{} color attachments exceed the limit of {MAX_COLOR_ATTACHMENTS}",
                color.len()
            )));
        }
        let Some(first) = color.first().copied().or(depth) else {
            return Err(invalid("framebuffer needs at least one attachment"));
        };
        let (width, height) = (first.width(), first.height());

        let mut color_ids = Vec::with_capacity(color.len());
        for (slot, texture) in color.iter().enumerate() {
            if texture.format().is_depth() {
                return Err(invalid(format!("color attachment {slot} has depth format {:?}", texture.format())));
            }
            color_ids.push(Self::checked_attachment(texture, width, height)?);
        }
        let depth_id = match depth {
            Some(texture) if !texture.format().is_depth() => {
                return Err(invalid(format!("depth attachment has color format {:?}", texture.format())));
            }
            Some(texture) => Some(Self::checked_attachment(texture, width, height)?),
            None => None,
        };

        let has_depth = depth_id.is_some();
        let color_attachments = color_ids.len();
        let desc = FramebufferDesc {
            width,
            height,
            color: color_ids,
            depth: depth_id,
        };
        let id = device.run_blocking(move |gl| gl.create_framebuffer(&desc))?;
        tracing::debug!(id = id.get(), width, height, color_attachments, has_depth, "framebuffer created");

        Ok(Self {
            handle: ResourceHandle::new(device, ResourceKind::Framebuffer, id),
            width,
            height,
            color_attachments,
            has_depth,
        })
    }

    fn checked_attachment(texture: &Texture, width: u32, height: u32) -> RenderResult<NativeId> {
        let id = texture.handle().live_id()?;
        if texture.width() != width || texture.height() != height {
            return Err(invalid(format!(
                "attachment {}x{} does not match {width}x{height}",
                texture.width(),
                texture.height()
            )));
        }
        Ok(id)
    }

    /// Attachment width.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Attachment height.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of color attachments.
    #[inline]
    #[must_use]
    pub fn color_attachments(&self) -> usize {
        self.color_attachments
    }

    /// Returns true if a depth attachment is present.
    #[inline]
    #[must_use]
    pub fn has_depth(&self) -> bool {
        self.has_depth
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
