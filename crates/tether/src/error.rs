//! # Runtime Error Types
//!
//! Errors surfaced while starting the runtime. Once the run loop is ticking,
//! nothing in it fails: the dispatcher has no error path.

use std::io;
use std::path::PathBuf;

use tether_render::RenderError;
use thiserror::Error;

/// Errors that can occur in the runtime crate.
#[derive(Error, Debug)]
pub enum TetherError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::TetherConfig`].
    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A resource operation failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for runtime operations.
pub type TetherResult<T> = Result<T, TetherError>;
