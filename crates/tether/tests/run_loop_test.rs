//! # Run Loop Integration Tests
//!
//! The run loop servicing worker threads that create and drop resources,
//! followed by shutdown.
//!
//! Run with: cargo test -p tether --test run_loop_test

use std::sync::Arc;
use std::thread;

use tether::core::MainThreadDispatcher;
use tether::render::{Buffer, BufferDesc, BufferUsage, HeadlessBackend, RenderDevice, ResourceKind};
use tether::{RunLoop, TetherConfig, TetherError};

fn fast_config() -> TetherConfig {
    TetherConfig::from_toml_str(
        r"
        [run_loop]
        target_fps = 1000
        max_frames = 100000

        [shutdown]
        drain_ticks = 4
        ",
    )
    .unwrap()
}

#[test]
fn test_run_loop_serves_workers() {
    let config = fast_config();
    let dispatcher = MainThreadDispatcher::new();
    let backend = Arc::new(HeadlessBackend::new());
    let device = RenderDevice::new(Arc::clone(&dispatcher), Arc::clone(&backend));
    let mut run_loop = RunLoop::new(&config, Arc::clone(&dispatcher));

    let workers: Vec<_> = (0..3)
        .map(|_| {
            let device = device.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    let buffer = Buffer::new(&device, BufferDesc::new(32, BufferUsage::Vertex)).unwrap();
                    buffer.update(0, &[1; 8]).unwrap();
                }
            })
        })
        .collect();

    let frames = run_loop.run_until(|_| workers.iter().all(thread::JoinHandle::is_finished));
    assert!(frames > 0);
    for worker in workers {
        worker.join().unwrap();
    }

    let report = run_loop.shutdown();

    assert!(report.is_clean());
    assert_eq!(backend.created(ResourceKind::Buffer), 30);
    assert_eq!(backend.deleted(ResourceKind::Buffer), 30);
    assert_eq!(backend.live_objects(), 0);
    assert_eq!(run_loop.stats().sync_executed, 60);
}

#[test]
fn test_blocking_teardown_at_shutdown() {
    let config = fast_config();
    let dispatcher = MainThreadDispatcher::new();
    let backend = Arc::new(HeadlessBackend::new());
    let device = RenderDevice::new(Arc::clone(&dispatcher), Arc::clone(&backend));
    let mut run_loop = RunLoop::new(&config, Arc::clone(&dispatcher));

    let buffer = Buffer::new(&device, BufferDesc::new(16, BufferUsage::Index)).unwrap();
    device.begin_shutdown();

    // Dropped on a worker: blocks until the run loop drains it.
    let worker = thread::spawn(move || drop(buffer));
    run_loop.run_until(|_| worker.is_finished());
    worker.join().unwrap();

    assert_eq!(backend.deleted(ResourceKind::Buffer), 1);
    assert_eq!(run_loop.shutdown().drain_ticks, 0);
}

#[test]
fn test_config_file_round_trip_through_disk() {
    let path = std::env::temp_dir().join(format!("tether_run_loop_test_{}.toml", std::process::id()));
    std::fs::write(&path, "[workers]\ncount = 7\n").unwrap();

    let config = TetherConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.workers.count, 7);
    assert_eq!(config.run_loop.target_fps, 60);
}

#[test]
fn test_invalid_config_file() {
    let path = std::env::temp_dir().join(format!("tether_invalid_config_{}.toml", std::process::id()));
    std::fs::write(&path, "[workers]\ncount = 0\n").unwrap();

    let result = TetherConfig::load(&path);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(result, Err(TetherError::InvalidConfig(_))));
}
