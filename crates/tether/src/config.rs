//! # Runtime Configuration
//!
//! Loaded once at startup from TOML. Every table is optional; missing keys
//! fall back to the defaults below.
//!
//! ```toml
//! [run_loop]
//! target_fps = 60
//! frame_budget_us = 16666
//! max_frames = 600
//! enable_timing_logs = true
//!
//! [workers]
//! count = 4
//! resources_per_worker = 16
//!
//! [shutdown]
//! drain_ticks = 8
//! blocking_teardown = true
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TetherError, TetherResult};

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    /// Frame pacing and timing.
    pub run_loop: RunLoopConfig,
    /// Demo worker threads.
    pub workers: WorkerConfig,
    /// Shutdown drain policy.
    pub shutdown: ShutdownConfig,
}

/// Frame pacing and timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLoopConfig {
    /// Frames per second the loop paces itself to.
    pub target_fps: u32,
    /// A frame taking longer than this counts as over budget.
    pub frame_budget_us: u64,
    /// Stop after this many frames. `None` runs until the caller stops.
    pub max_frames: Option<u64>,
    /// Log a warning for every over-budget frame.
    pub enable_timing_logs: bool,
}

impl Default for RunLoopConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            frame_budget_us: 16_666,
            max_frames: None,
            enable_timing_logs: false,
        }
    }
}

impl RunLoopConfig {
    /// Wall time between frame starts.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }

    /// Over-budget threshold.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        Duration::from_micros(self.frame_budget_us)
    }
}

/// Demo worker threads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of worker threads.
    pub count: usize,
    /// Resources each worker creates and drops.
    pub resources_per_worker: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: 4,
            resources_per_worker: 16,
        }
    }
}

/// Shutdown drain policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Drains attempted before whatever is still queued gets discarded.
    pub drain_ticks: u32,
    /// Switch the render device to blocking teardown before the final drains.
    pub blocking_teardown: bool,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_ticks: 8,
            blocking_teardown: true,
        }
    }
}

impl TetherConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`TetherError::Config`] on malformed TOML, [`TetherError::InvalidConfig`]
    /// when a value is out of range.
    pub fn from_toml_str(source: &str) -> TetherResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`TetherError::Io`] if the file cannot be read, otherwise as
    /// [`TetherConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> TetherResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| TetherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`TetherError::InvalidConfig`] naming the first offending key.
    pub fn validate(&self) -> TetherResult<()> {
        if self.run_loop.target_fps == 0 {
            return Err(TetherError::InvalidConfig("run_loop.target_fps must be > 0".into()));
        }
        if self.run_loop.frame_budget_us == 0 {
            return Err(TetherError::InvalidConfig("run_loop.frame_budget_us must be > 0".into()));
        }
        if self.workers.count == 0 {
            return Err(TetherError::InvalidConfig("workers.count must be > 0".into()));
        }
        if self.shutdown.drain_ticks == 0 {
            return Err(TetherError::InvalidConfig("shutdown.drain_ticks must be > 0".into()));
        }
        Ok(())
    }

    /// Renders the configuration back to TOML.
    ///
    /// # Errors
    ///
    /// Only if serialization fails, which the shape of these types rules out.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = TetherConfig::from_toml_str("").unwrap();
        assert_eq!(config, TetherConfig::default());
        assert_eq!(config.run_loop.target_fps, 60);
        assert_eq!(config.shutdown.drain_ticks, 8);
        assert!(config.shutdown.blocking_teardown);
    }

    #[test]
    fn test_partial_tables() {
        let config = TetherConfig::from_toml_str(
            r"
            [run_loop]
            max_frames = 120

            [workers]
            count = 2
            ",
        )
        .unwrap();

        assert_eq!(config.run_loop.max_frames, Some(120));
        assert_eq!(config.run_loop.target_fps, 60);
        assert_eq!(config.workers.count, 2);
        assert_eq!(config.workers.resources_per_worker, 16);
    }

    #[test]
    fn test_zero_fps_rejected() {
        let err = TetherConfig::from_toml_str("[run_loop]\ntarget_fps = 0\n").unwrap_err();
        assert!(matches!(err, TetherError::InvalidConfig(msg) if msg.contains("target_fps")));
    }

    #[test]
    fn test_zero_drain_ticks_rejected() {
        let err = TetherConfig::from_toml_str("[shutdown]\ndrain_ticks = 0\n").unwrap_err();
        assert!(matches!(err, TetherError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = TetherConfig::from_toml_str("[run_loop\n").unwrap_err();
        assert!(matches!(err, TetherError::Config(_)));
    }

    #[test]
    fn test_wrong_type() {
        let err = TetherConfig::from_toml_str("[workers]\ncount = \"many\"\n").unwrap_err();
        assert!(matches!(err, TetherError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = TetherConfig::load("/nonexistent/tether.toml").unwrap_err();
        assert!(matches!(err, TetherError::Io { .. }));
    }

    #[test]
    fn test_frame_interval() {
        let config = RunLoopConfig {
            target_fps: 50,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(20));
        assert_eq!(config.frame_budget(), Duration::from_micros(16_666));
    }

    #[test]
    fn test_written_config_reads_back() {
        let mut config = TetherConfig::default();
        config.run_loop.max_frames = Some(10);
        config.workers.count = 3;

        let text = config.to_toml_string().unwrap();
        assert_eq!(TetherConfig::from_toml_str(&text).unwrap(), config);
    }
}
