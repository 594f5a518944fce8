//! # Run Loop
//!
//! Owns the designated thread's frame cadence:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. DRAIN                                                            │
//! │    ├─ Async batch (teardown, fire-and-forget updates)               │
//! │    └─ Sync batch (creation requests, waiters released)              │
//! │                                                                     │
//! │ 2. FRAME CALLBACK                                                   │
//! │    └─ Caller's own designated-thread work, decides whether to stop  │
//! │                                                                     │
//! │ 3. END FRAME                                                        │
//! │    └─ Record timing, sleep out the rest of the frame interval       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Must be created and driven on the dispatcher's designated thread.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tether_core::MainThreadDispatcher;

use crate::config::{RunLoopConfig, ShutdownConfig, TetherConfig};

/// Frame interval at the default 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Timing and work counts for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number, starting at 0.
    pub frame: u64,
    /// Time spent in `process_queue`, in microseconds.
    pub drain_us: u64,
    /// Whole tick including bookkeeping, in microseconds.
    pub total_us: u64,
    /// Async tasks run this frame.
    pub async_executed: usize,
    /// Sync items run this frame.
    pub sync_executed: usize,
}

/// What `shutdown` did with the remaining work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Drains performed.
    pub drain_ticks: u32,
    /// Async tasks and sync items run during those drains.
    pub executed: usize,
    /// Async tasks discarded afterwards.
    pub discarded: usize,
    /// Sync items still waiting when the loop gave up.
    pub sync_pending: usize,
}

impl ShutdownReport {
    /// Returns true if every submitted piece of work ran.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.discarded == 0 && self.sync_pending == 0
    }
}

/// Drives the dispatcher once per frame.
pub struct RunLoop {
    dispatcher: Arc<MainThreadDispatcher>,
    config: RunLoopConfig,
    shutdown: ShutdownConfig,
    frame_count: u64,
    stats_accumulator: FrameStatsAccumulator,
}

impl RunLoop {
    /// Creates a run loop over `dispatcher`.
    #[must_use]
    pub fn new(config: &TetherConfig, dispatcher: Arc<MainThreadDispatcher>) -> Self {
        debug_assert!(
            dispatcher.is_designated_thread(),
            "RunLoop must live on the dispatcher's designated thread"
        );
        Self {
            dispatcher,
            config: config.run_loop.clone(),
            shutdown: config.shutdown.clone(),
            frame_count: 0,
            stats_accumulator: FrameStatsAccumulator::with_budget(
                u64::try_from(config.run_loop.frame_budget().as_micros()).unwrap_or(u64::MAX),
            ),
        }
    }

    /// Runs one frame: a single drain plus bookkeeping. Does not sleep.
    pub fn tick(&mut self) -> FrameStats {
        let start = Instant::now();
        let report = self.dispatcher.process_queue();
        let drain_us = elapsed_us(start);

        let stats = FrameStats {
            frame: self.frame_count,
            drain_us,
            total_us: elapsed_us(start),
            async_executed: report.async_executed,
            sync_executed: report.sync_executed,
        };
        self.end_frame(stats);
        stats
    }

    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.stats_accumulator.record(stats);

        let budget = self.config.frame_budget();
        if self.config.enable_timing_logs && Duration::from_micros(stats.total_us) > budget {
            tracing::warn!(
                frame = stats.frame,
                total_us = stats.total_us,
                budget_us = ?budget,
                "frame exceeded budget"
            );
        }
    }

    /// Ticks at the configured rate until `done` returns true or
    /// `max_frames` is reached. Returns the number of frames run.
    ///
    /// `done` runs on the designated thread after each drain, so it may do
    /// designated-thread work of its own.
    pub fn run_until<F>(&mut self, mut done: F) -> u64
    where
        F: FnMut(&FrameStats) -> bool,
    {
        let interval = self.config.frame_interval();
        let first_frame = self.frame_count;
        tracing::info!(
            target_fps = self.config.target_fps,
            max_frames = ?self.config.max_frames,
            "run loop started"
        );

        loop {
            if self
                .config
                .max_frames
                .is_some_and(|max| self.frame_count >= max)
            {
                break;
            }

            let frame_start = Instant::now();
            let stats = self.tick();
            if done(&stats) {
                break;
            }

            if let Some(rest) = interval.checked_sub(frame_start.elapsed()) {
                thread::sleep(rest);
            }
        }

        let frames = self.frame_count - first_frame;
        tracing::info!(frames, "run loop stopped");
        frames
    }

    /// Drains until both queues are empty or `drain_ticks` is used up, then
    /// discards whatever async work is left.
    ///
    /// Sync items cannot be discarded: their submitters are blocked. They are
    /// reported in [`ShutdownReport::sync_pending`].
    pub fn shutdown(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        while report.drain_ticks < self.shutdown.drain_ticks && self.has_pending_work() {
            let stats = self.tick();
            report.drain_ticks += 1;
            report.executed += stats.async_executed + stats.sync_executed;
        }

        report.discarded = self.dispatcher.clear_queue();
        report.sync_pending = self.dispatcher.sync_queue_size();

        if report.is_clean() {
            tracing::info!(
                drain_ticks = report.drain_ticks,
                executed = report.executed,
                "run loop shut down cleanly"
            );
        } else {
            tracing::warn!(
                discarded = report.discarded,
                sync_pending = report.sync_pending,
                "run loop shut down with work outstanding"
            );
        }
        report
    }

    fn has_pending_work(&self) -> bool {
        self.dispatcher.queue_size() > 0 || self.dispatcher.sync_queue_size() > 0
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The dispatcher being drained.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<MainThreadDispatcher> {
        &self.dispatcher
    }

    /// Accumulated frame statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

fn elapsed_us(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of drain times.
    pub drain_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
    /// Async tasks run across all frames.
    pub async_executed: u64,
    /// Sync items run across all frames.
    pub sync_executed: u64,
    budget_us: u64,
}

impl FrameStatsAccumulator {
    /// Creates an accumulator using the default 60 FPS budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_budget(u64::try_from(TARGET_FRAME_TIME.as_micros()).unwrap_or(u64::MAX))
    }

    /// Creates an accumulator that counts frames longer than `budget_us`.
    #[must_use]
    pub fn with_budget(budget_us: u64) -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            drain_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            async_executed: 0,
            sync_executed: 0,
            budget_us,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum = self.total_us_sum.saturating_add(stats.total_us);
        self.drain_us_sum = self.drain_us_sum.saturating_add(stats.drain_us);
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.async_executed += stats.async_executed as u64;
        self.sync_executed += stats.sync_executed as u64;

        if stats.total_us > self.budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average drain time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_drain_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.drain_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Prints a summary of the statistics.
    #[allow(clippy::cast_precision_loss)]
    pub fn print_summary(&self) {
        let min_ms = if self.frames_recorded == 0 {
            0.0
        } else {
            self.min_frame_us as f64 / 1000.0
        };

        println!("┌─ FRAMES ───────────────────────────────────────────────────────┐");
        println!("│ Frames Recorded:    {}", self.frames_recorded);
        println!("│ Average Frame:      {:.3} ms", self.avg_frame_ms());
        println!("│ Average Drain:      {:.3} ms", self.avg_drain_ms());
        println!("│ Min Frame:          {min_ms:.3} ms");
        println!("│ Max Frame:          {:.3} ms", self.max_frame_us as f64 / 1000.0);
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ BUDGET ───────────────────────────────────────────────────────┐");
        println!("│ Target:             {:.3} ms", self.budget_us as f64 / 1000.0);
        println!(
            "│ Over Budget:        {} frames ({:.1}%)",
            self.frames_over_budget,
            self.over_budget_ratio() * 100.0
        );
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ WORK ─────────────────────────────────────────────────────────┐");
        println!("│ Async Executed:     {}", self.async_executed);
        println!("│ Sync Executed:      {}", self.sync_executed);
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_config() -> TetherConfig {
        let mut config = TetherConfig::default();
        config.run_loop.target_fps = 1_000;
        config
    }

    #[test]
    fn test_run_loop_creation() {
        let run_loop = RunLoop::new(&TetherConfig::default(), MainThreadDispatcher::new());
        assert_eq!(run_loop.frame_count(), 0);
        assert_eq!(run_loop.stats().frames_recorded, 0);
    }

    #[test]
    fn test_tick_drains_once() {
        let dispatcher = MainThreadDispatcher::new();
        let mut run_loop = RunLoop::new(&fast_config(), Arc::clone(&dispatcher));
        dispatcher.dispatch(|| {});
        dispatcher.dispatch(|| {});

        let stats = run_loop.tick();

        assert_eq!(stats.frame, 0);
        assert_eq!(stats.async_executed, 2);
        assert!(stats.total_us >= stats.drain_us);
        assert_eq!(run_loop.frame_count(), 1);
        assert_eq!(run_loop.stats().async_executed, 2);
    }

    #[test]
    fn test_slow_frame_counted_against_configured_budget() {
        let dispatcher = MainThreadDispatcher::new();
        let mut config = fast_config();
        config.run_loop.frame_budget_us = 1_000;
        config.run_loop.enable_timing_logs = true;
        let mut run_loop = RunLoop::new(&config, Arc::clone(&dispatcher));

        dispatcher.dispatch(|| thread::sleep(Duration::from_millis(5)));
        let slow = run_loop.tick();

        assert!(slow.total_us > 1_000);
        assert_eq!(run_loop.stats().frames_over_budget, 1);
    }

    #[test]
    fn test_run_until_stops_on_predicate() {
        let mut run_loop = RunLoop::new(&fast_config(), MainThreadDispatcher::new());
        let frames = run_loop.run_until(|stats| stats.frame == 4);
        assert_eq!(frames, 5);
    }

    #[test]
    fn test_run_until_respects_max_frames() {
        let mut config = fast_config();
        config.run_loop.max_frames = Some(3);
        let mut run_loop = RunLoop::new(&config, MainThreadDispatcher::new());

        assert_eq!(run_loop.run_until(|_| false), 3);
        // Already at the cap.
        assert_eq!(run_loop.run_until(|_| false), 0);
    }

    #[test]
    fn test_shutdown_follows_chained_work() {
        let dispatcher = MainThreadDispatcher::new();
        let mut run_loop = RunLoop::new(&fast_config(), Arc::clone(&dispatcher));
        let ran = Arc::new(AtomicUsize::new(0));

        {
            let inner_dispatcher = Arc::clone(&dispatcher);
            let ran = Arc::clone(&ran);
            dispatcher.dispatch(move || {
                ran.fetch_add(1, Ordering::SeqCst);
                let ran = Arc::clone(&ran);
                inner_dispatcher.dispatch(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                });
            });
        }

        let report = run_loop.shutdown();

        assert_eq!(report.drain_ticks, 2);
        assert_eq!(report.executed, 2);
        assert!(report.is_clean());
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    fn respawn(dispatcher: Arc<MainThreadDispatcher>) {
        let next = Arc::clone(&dispatcher);
        dispatcher.dispatch(move || respawn(next));
    }

    #[test]
    fn test_shutdown_discards_endless_chain() {
        let dispatcher = MainThreadDispatcher::new();
        let mut config = fast_config();
        config.shutdown.drain_ticks = 3;
        let mut run_loop = RunLoop::new(&config, Arc::clone(&dispatcher));

        respawn(Arc::clone(&dispatcher));
        let report = run_loop.shutdown();

        assert_eq!(report.drain_ticks, 3);
        assert_eq!(report.executed, 3);
        assert_eq!(report.discarded, 1);
        assert!(!report.is_clean());
        assert_eq!(dispatcher.queue_size(), 0);
    }

    #[test]
    fn test_shutdown_with_nothing_queued() {
        let mut run_loop = RunLoop::new(&fast_config(), MainThreadDispatcher::new());
        assert_eq!(run_loop.shutdown(), ShutdownReport::default());
    }

    #[test]
    fn test_stats_accumulator() {
        let mut acc = FrameStatsAccumulator::with_budget(10_000);

        for i in 0..100 {
            acc.record(FrameStats {
                frame: i,
                drain_us: 100,
                total_us: 9_950 + i,
                async_executed: 1,
                sync_executed: 0,
            });
        }

        assert_eq!(acc.frames_recorded, 100);
        assert_eq!(acc.frames_over_budget, 49);
        assert_eq!(acc.min_frame_us, 9_950);
        assert_eq!(acc.max_frame_us, 10_049);
        assert_eq!(acc.async_executed, 100);
        assert!((acc.avg_drain_ms() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_accumulator() {
        let acc = FrameStatsAccumulator::new();
        assert!(acc.avg_frame_ms().abs() < f64::EPSILON);
        assert!(acc.over_budget_ratio().abs() < f64::EPSILON);
    }
}
