//! # TETHER Demo
//!
//! Worker threads create, mutate and drop GPU-style resources while the main
//! thread runs the loop that services them. Ends with a blocking teardown
//! and a leak check.
//!
//! Usage: `tether_demo [config.toml]`

use std::process;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use tether::render::{
    Buffer, BufferDesc, BufferUsage, Framebuffer, HeadlessBackend, Pipeline, RenderDevice, RenderResult,
    ResourceKind, Shader, ShaderStage, Texture, TextureDesc, TextureFormat,
};
use tether::core::MainThreadDispatcher;
use tether::{RunLoop, TetherConfig, TetherResult};

const VERTEX_SOURCE: &str = "layout(location = 0) in vec3 p; void main() { gl_Position = vec4(p, 1.0); }";
const FRAGMENT_SOURCE: &str = "out vec4 color; void main() { color = vec4(1.0); }";

/// Sent by each worker when it finishes.
struct WorkerReport {
    worker: usize,
    created: usize,
    failed: usize,
    /// Kept alive past the worker so it is torn down at shutdown.
    retained: Buffer,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("   ✗ FATAL: {err}");
        process::exit(1);
    }
}

fn run() -> TetherResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => TetherConfig::load(path)?,
        None => TetherConfig::default(),
    };

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                         TETHER DEMO");
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  Workers:            {}", config.workers.count);
    println!("  Resources/worker:   {}", config.workers.resources_per_worker);
    println!("  Target FPS:         {}", config.run_loop.target_fps);
    println!();

    // This thread becomes the designated thread.
    let dispatcher = MainThreadDispatcher::new();
    let backend = Arc::new(HeadlessBackend::new());
    let device = RenderDevice::new(Arc::clone(&dispatcher), Arc::clone(&backend));
    let mut run_loop = RunLoop::new(&config, Arc::clone(&dispatcher));

    let (report_tx, report_rx) = unbounded();
    let workers: Vec<JoinHandle<()>> = (0..config.workers.count)
        .map(|worker| {
            let device = device.clone();
            let tx = report_tx.clone();
            let per_worker = config.workers.resources_per_worker;
            thread::spawn(move || worker_main(worker, per_worker, &device, &tx))
        })
        .collect();
    drop(report_tx);

    run_loop.run_until(|_| workers.iter().all(JoinHandle::is_finished));
    // Blocked submitters cannot be abandoned: keep serving them past max_frames.
    while workers.iter().any(|w| !w.is_finished()) {
        run_loop.tick();
    }

    let mut panicked = 0;
    for worker in workers {
        if worker.join().is_err() {
            panicked += 1;
        }
    }

    let reports: Vec<WorkerReport> = report_rx.try_iter().collect();
    println!("┌─ WORKERS ──────────────────────────────────────────────────────┐");
    for report in &reports {
        println!(
            "│ Worker {:>2}:          {} created, {} failed",
            report.worker, report.created, report.failed
        );
    }
    if panicked > 0 {
        println!("│ Panicked:           {panicked}");
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    if config.shutdown.blocking_teardown {
        device.begin_shutdown();
    }
    let retained: Vec<Buffer> = reports.into_iter().map(|report| report.retained).collect();
    let retained_count = retained.len();
    drop(retained);
    let shutdown = run_loop.shutdown();

    run_loop.stats().print_summary();
    println!();
    print_backend_summary(&dispatcher, &backend);
    println!();
    println!("┌─ SHUTDOWN ─────────────────────────────────────────────────────┐");
    println!("│ Retained Released:  {retained_count}");
    println!("│ Drain Ticks:        {}", shutdown.drain_ticks);
    println!("│ Executed:           {}", shutdown.executed);
    println!("│ Discarded:          {}", shutdown.discarded);
    println!("└──────────────────────────────────────────────────────────────────┘");

    let leaked = backend.live_objects();
    if leaked > 0 || backend.confinement_violations() > 0 || panicked > 0 {
        eprintln!("   ✗ {leaked} native objects leaked, {} confinement violations", backend.confinement_violations());
        process::exit(1);
    }
    println!();
    println!("   ✓ All native objects freed on the designated thread");
    Ok(())
}

fn worker_main(worker: usize, per_worker: usize, device: &RenderDevice, tx: &Sender<WorkerReport>) {
    let mut created = 0;
    let mut failed = 0;

    for i in 0..per_worker {
        match churn(device, worker, i) {
            Ok(count) => created += count,
            Err(err) => {
                tracing::warn!(worker, %err, "resource churn failed");
                failed += 1;
            }
        }
    }

    let retained = match Buffer::new(device, BufferDesc::new(64, BufferUsage::Uniform)) {
        Ok(buffer) => buffer,
        Err(err) => {
            tracing::error!(worker, %err, "could not create retained buffer");
            return;
        }
    };
    created += 1;

    // The receiver lives until main collects the reports.
    let _ = tx.send(WorkerReport {
        worker,
        created,
        failed,
        retained,
    });
}

/// Creates, touches and drops one group of resources. Returns how many were created.
#[allow(clippy::cast_possible_truncation)]
fn churn(device: &RenderDevice, worker: usize, iteration: usize) -> RenderResult<usize> {
    let tag = (worker * 31 + iteration) as u8;
    match iteration % 4 {
        0 => {
            let buffer = Buffer::new(device, BufferDesc::with_data(BufferUsage::Vertex, vec![tag; 48]))?;
            buffer.update(0, &[tag.wrapping_add(1); 12])?;
            Ok(1)
        }
        1 => {
            let texture = Texture::new(device, TextureDesc::new(16, 16, TextureFormat::Rgba8))?;
            texture.upload(&vec![tag; texture.byte_len()])?;
            Ok(1)
        }
        2 => {
            let vs = Shader::new(device, ShaderStage::Vertex, VERTEX_SOURCE)?;
            let fs = Shader::new(device, ShaderStage::Fragment, FRAGMENT_SOURCE)?;
            let pipeline = Pipeline::new(device, &vs, &fs)?;
            pipeline.bind()?;
            Ok(3)
        }
        _ => {
            let color = Texture::new(device, TextureDesc::new(32, 32, TextureFormat::Rgba16F))?;
            let depth = Texture::new(device, TextureDesc::new(32, 32, TextureFormat::Depth24Stencil8))?;
            let _framebuffer = Framebuffer::new(device, &[&color], Some(&depth))?;
            Ok(3)
        }
    }
}

fn print_backend_summary(dispatcher: &MainThreadDispatcher, backend: &HeadlessBackend) {
    let stats = dispatcher.stats();
    println!("┌─ DISPATCHER ───────────────────────────────────────────────────┐");
    println!("│ Async Submitted:    {}", stats.async_submitted);
    println!("│ Sync Submitted:     {}", stats.sync_submitted);
    println!("│ Sync Inline:        {}", stats.sync_inline);
    println!("│ Drains:             {}", stats.drains);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ NATIVE OBJECTS ───────────────────────────────────────────────┐");
    for kind in ResourceKind::ALL {
        println!(
            "│ {:<12}        {} created, {} deleted",
            kind.name(),
            backend.created(kind),
            backend.deleted(kind)
        );
    }
    println!("│ Live:               {}", backend.live_objects());
    println!("└──────────────────────────────────────────────────────────────────┘");
}
