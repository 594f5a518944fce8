//! # TETHER
//!
//! The runtime that owns the designated thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   dispatch / dispatch_sync   ┌──────────────────────┐
//! │   Worker threads     │ ───────────────────────────> │ MainThreadDispatcher │
//! │  Buffer::new, drop,  │                              │  async + sync queues │
//! │  Texture::upload ... │ <──── sync results ───────── │                      │
//! └──────────────────────┘                              └──────────┬───────────┘
//!                                                                  │ process_queue
//!                                                       ┌──────────▼───────────┐
//!                                                       │ RunLoop (main thread)│
//!                                                       │  tick / run_until /  │
//!                                                       │  shutdown            │
//!                                                       └──────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML configuration, loaded once at startup
//! - `run_loop`: frame cadence, timing and shutdown drain
//! - `error`: startup errors

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod run_loop;

pub use tether_core as core;
pub use tether_render as render;

pub use config::{RunLoopConfig, ShutdownConfig, TetherConfig, WorkerConfig};
pub use error::{TetherError, TetherResult};
pub use run_loop::{FrameStats, FrameStatsAccumulator, RunLoop, ShutdownReport, TARGET_FRAME_TIME};
