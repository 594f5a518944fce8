//! # Render Error Types
//!
//! All errors that can occur while creating or mutating thread-confined
//! resources. The dispatcher never produces these: closures do, and the
//! calling site inspects them after the blocking call returns.

use thiserror::Error;

use crate::handle::ResourceKind;

/// Errors that can occur in the render resource layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Build parameters rejected on the calling thread, before any native call.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// The native call ran on the designated thread and reported a failure.
    #[error("native call failed (0x{code:04X}): {message}")]
    Native {
        /// GL-style error enum value.
        code: u32,
        /// Driver message or info log.
        message: String,
    },

    /// A native call reached the backend from a thread that does not own the context.
    #[error("native call `{call}` issued off the designated thread")]
    WrongThread {
        /// Name of the native entry point.
        call: &'static str,
    },

    /// The handle was already submitted for destruction.
    #[error("{0} handle already released")]
    Released(ResourceKind),
}

/// Result type for render resource operations.
pub type RenderResult<T> = Result<T, RenderError>;
