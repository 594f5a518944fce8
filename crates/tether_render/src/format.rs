//! Format and enum mapping to GL-style native constants.
//!
//! Pure table lookups. Safe to call from any thread.

/// GL enum values used by the mapping tables and the headless backend.
pub mod gl {
    #![allow(missing_docs)]

    // Errors
    pub const INVALID_ENUM: u32 = 0x0500;
    pub const INVALID_VALUE: u32 = 0x0501;
    pub const INVALID_OPERATION: u32 = 0x0502;
    pub const OUT_OF_MEMORY: u32 = 0x0505;

    // Data types
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const FLOAT: u32 = 0x1406;
    pub const HALF_FLOAT: u32 = 0x140B;
    pub const UNSIGNED_INT_24_8: u32 = 0x84FA;

    // Pixel formats
    pub const DEPTH_COMPONENT: u32 = 0x1902;
    pub const RED: u32 = 0x1903;
    pub const RGBA: u32 = 0x1908;
    pub const RG: u32 = 0x8227;
    pub const DEPTH_STENCIL: u32 = 0x84F9;

    // Internal formats
    pub const RGBA8: u32 = 0x8058;
    pub const R8: u32 = 0x8229;
    pub const RG8: u32 = 0x822B;
    pub const R16F: u32 = 0x822D;
    pub const R32F: u32 = 0x822E;
    pub const RGBA32F: u32 = 0x8814;
    pub const RGBA16F: u32 = 0x881A;
    pub const DEPTH24_STENCIL8: u32 = 0x88F0;
    pub const SRGB8_ALPHA8: u32 = 0x8C43;
    pub const DEPTH_COMPONENT32F: u32 = 0x8CAC;

    // Buffer targets
    pub const ARRAY_BUFFER: u32 = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;
    pub const UNIFORM_BUFFER: u32 = 0x8A11;
    pub const SHADER_STORAGE_BUFFER: u32 = 0x90D2;

    // Shader types
    pub const FRAGMENT_SHADER: u32 = 0x8B30;
    pub const VERTEX_SHADER: u32 = 0x8B31;
    pub const COMPUTE_SHADER: u32 = 0x91B9;
}

/// Texel formats supported by [`crate::Texture`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit red.
    R8,
    /// 8-bit red/green.
    Rg8,
    /// 8-bit RGBA, linear.
    Rgba8,
    /// 8-bit RGBA, sRGB encoded.
    Rgba8Srgb,
    /// 16-bit float red.
    R16F,
    /// 16-bit float RGBA.
    Rgba16F,
    /// 32-bit float red.
    R32F,
    /// 32-bit float RGBA.
    Rgba32F,
    /// 24-bit depth + 8-bit stencil.
    Depth24Stencil8,
    /// 32-bit float depth.
    Depth32F,
}

/// The three enums a GL texture upload needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlFormat {
    /// `internalformat` argument.
    pub internal_format: u32,
    /// `format` argument.
    pub format: u32,
    /// `type` argument.
    pub data_type: u32,
}

impl TextureFormat {
    /// Maps to the native upload enums.
    #[must_use]
    pub const fn to_gl(self) -> GlFormat {
        let (internal_format, format, data_type) = match self {
            Self::R8 => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
            Self::Rg8 => (gl::RG8, gl::RG, gl::UNSIGNED_BYTE),
            Self::Rgba8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
            Self::Rgba8Srgb => (gl::SRGB8_ALPHA8, gl::RGBA, gl::UNSIGNED_BYTE),
            Self::R16F => (gl::R16F, gl::RED, gl::HALF_FLOAT),
            Self::Rgba16F => (gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT),
            Self::R32F => (gl::R32F, gl::RED, gl::FLOAT),
            Self::Rgba32F => (gl::RGBA32F, gl::RGBA, gl::FLOAT),
            Self::Depth24Stencil8 => (gl::DEPTH24_STENCIL8, gl::DEPTH_STENCIL, gl::UNSIGNED_INT_24_8),
            Self::Depth32F => (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
        };
        GlFormat {
            internal_format,
            format,
            data_type,
        }
    }

    /// Size of one texel in bytes.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rg8 | Self::R16F => 2,
            Self::Rgba8 | Self::Rgba8Srgb | Self::R32F | Self::Depth24Stencil8 | Self::Depth32F => 4,
            Self::Rgba16F => 8,
            Self::Rgba32F => 16,
        }
    }

    /// Returns true for depth(-stencil) formats.
    #[must_use]
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::Depth24Stencil8 | Self::Depth32F)
    }
}

/// What a buffer is bound as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex attributes.
    Vertex,
    /// Element indices.
    Index,
    /// Uniform block.
    Uniform,
    /// Shader storage block.
    Storage,
}

impl BufferUsage {
    /// Native binding target.
    #[must_use]
    pub const fn gl_target(self) -> u32 {
        match self {
            Self::Vertex => gl::ARRAY_BUFFER,
            Self::Index => gl::ELEMENT_ARRAY_BUFFER,
            Self::Uniform => gl::UNIFORM_BUFFER,
            Self::Storage => gl::SHADER_STORAGE_BUFFER,
        }
    }
}

/// Programmable pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
    /// Compute stage.
    Compute,
}

impl ShaderStage {
    /// Native shader type.
    #[must_use]
    pub const fn gl_type(self) -> u32 {
        match self {
            Self::Vertex => gl::VERTEX_SHADER,
            Self::Fragment => gl::FRAGMENT_SHADER,
            Self::Compute => gl::COMPUTE_SHADER,
        }
    }
}
