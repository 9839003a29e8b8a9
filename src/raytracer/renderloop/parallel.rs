use super::{tiles, Tile, TILE_SIZE};
use crate::raytracer::config::RenderConfig;
use crate::raytracer::error::RenderError;
use crate::raytracer::framebuffer::Framebuffer;
use crate::raytracer::renderer::Renderer;
use crate::raytracer::rng::Pcg32;
use crate::raytracer::scene::Scene;
use glam::Vec3;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Granularity of the watcher's clock checks.
const WATCHER_POLL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct RenderStats {
    /// Non-finite samples dropped as zero contribution.
    pub discarded_samples: u64,
    pub completed_tiles: usize,
    pub total_tiles: usize,
    /// True when the wall-clock budget stopped the render early.
    pub aborted: bool,
    pub elapsed: Duration,
}

/// Tile-parallel render driver. Workers claim tiles from a shared atomic
/// index and render each into a private buffer before folding it into
/// the framebuffer, so pixel writes never race. A watcher thread keeps
/// the clock: periodic snapshots and the render time budget.
pub struct TiledRenderLoop {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl TiledRenderLoop {
    pub fn new(workers: usize) -> Result<Self, RenderError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("render-worker-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    /// Renders the scene to completion (or until the time budget runs
    /// out). `on_snapshot` receives a consistent copy of the buffer at
    /// every snapshot interval; partially rendered regions are simply
    /// still black.
    pub fn render<R, F>(
        &self,
        scene: &Scene,
        renderer: &R,
        config: &RenderConfig,
        on_snapshot: F,
    ) -> Result<(Framebuffer, RenderStats), RenderError>
    where
        R: Renderer + Sync,
        F: Fn(&Framebuffer) + Sync,
    {
        let tile_list = tiles(config.width, config.height, TILE_SIZE);
        let framebuffer = Mutex::new(Framebuffer::new(config.width, config.height)?);
        let next_tile = AtomicUsize::new(0);
        let completed_tiles = AtomicUsize::new(0);
        let discarded = AtomicU64::new(0);
        let stop = AtomicBool::new(false);
        let finished = Mutex::new(false);
        let finished_signal = Condvar::new();
        let start = Instant::now();

        info!(
            "rendering {}x{} with {} workers, {} tiles",
            config.width,
            config.height,
            self.workers,
            tile_list.len()
        );

        std::thread::scope(|s| {
            let watcher = s.spawn(|| {
                watch(
                    config,
                    start,
                    &framebuffer,
                    &completed_tiles,
                    tile_list.len(),
                    &stop,
                    &finished,
                    &finished_signal,
                    &on_snapshot,
                )
            });

            self.pool.broadcast(|_| {
                render_tiles(
                    scene,
                    renderer,
                    config,
                    &tile_list,
                    &next_tile,
                    &completed_tiles,
                    &discarded,
                    &stop,
                    &framebuffer,
                )
            });

            *finished.lock().unwrap() = true;
            finished_signal.notify_all();
            let _ = watcher.join();
        });

        let stats = RenderStats {
            discarded_samples: discarded.load(Ordering::Relaxed),
            completed_tiles: completed_tiles.load(Ordering::Relaxed),
            total_tiles: tile_list.len(),
            aborted: stop.load(Ordering::Acquire),
            elapsed: start.elapsed(),
        };
        let framebuffer = framebuffer.into_inner().unwrap();
        Ok((framebuffer, stats))
    }
}

/// One worker: claim the next tile, render it locally, merge, repeat.
#[allow(clippy::too_many_arguments)]
fn render_tiles<R: Renderer>(
    scene: &Scene,
    renderer: &R,
    config: &RenderConfig,
    tile_list: &[Tile],
    next_tile: &AtomicUsize,
    completed_tiles: &AtomicUsize,
    discarded: &AtomicU64,
    stop: &AtomicBool,
    framebuffer: &Mutex<Framebuffer>,
) {
    let sub = config.sub_samples;
    let samples_per_pixel = config.samples_per_pixel * sub * sub;

    loop {
        if stop.load(Ordering::Acquire) {
            break;
        }
        let index = next_tile.fetch_add(1, Ordering::Relaxed);
        let Some(tile) = tile_list.get(index) else {
            break;
        };

        // Seeding per tile rather than per worker keeps the image
        // independent of which thread claims which tile.
        let mut rng = Pcg32::new(
            config
                .seed
                .wrapping_add((index as u64 + 1).wrapping_mul(0x9E3779B97F4A7C15)),
        );

        let mut sums = vec![Vec3::ZERO; tile.pixel_count()];
        let mut dropped = 0u64;

        for y in tile.y0..tile.y1 {
            for x in tile.x0..tile.x1 {
                let mut acc = Vec3::ZERO;
                for sy in 0..sub {
                    for sx in 0..sub {
                        for _ in 0..config.samples_per_pixel {
                            let u = (x as f32 + (sx as f32 + rng.next()) / sub as f32)
                                / config.width as f32;
                            let v = (y as f32 + (sy as f32 + rng.next()) / sub as f32)
                                / config.height as f32;
                            // Row 0 is the top of the image; the camera's
                            // y axis points up.
                            let ray = scene.camera.primary_ray(u, 1.0 - v);
                            let radiance = renderer.radiance(&ray, scene, &mut rng);
                            if radiance.is_finite() {
                                acc += radiance;
                            } else {
                                dropped += 1;
                            }
                        }
                    }
                }
                let local =
                    ((y - tile.y0) * tile.width() + (x - tile.x0)) as usize;
                sums[local] = acc;
            }
        }

        framebuffer
            .lock()
            .unwrap()
            .merge_tile(tile.x0, tile.y0, tile.x1, tile.y1, &sums, samples_per_pixel);
        if dropped > 0 {
            discarded.fetch_add(dropped, Ordering::Relaxed);
        }
        completed_tiles.fetch_add(1, Ordering::Relaxed);
    }
}

/// The watcher: wakes every poll interval, emits snapshots on schedule,
/// and raises the stop flag when the time budget runs out. Returns once
/// the workers have finished.
#[allow(clippy::too_many_arguments)]
fn watch<F: Fn(&Framebuffer)>(
    config: &RenderConfig,
    start: Instant,
    framebuffer: &Mutex<Framebuffer>,
    completed_tiles: &AtomicUsize,
    total_tiles: usize,
    stop: &AtomicBool,
    finished: &Mutex<bool>,
    finished_signal: &Condvar,
    on_snapshot: &F,
) {
    let deadline = start + Duration::from_secs_f32(config.max_render_seconds);
    let interval = Duration::from_secs_f32(config.snapshot_interval_seconds);
    let mut next_snapshot = start + interval;

    let mut guard = finished.lock().unwrap();
    while !*guard {
        let (g, _) = finished_signal
            .wait_timeout(guard, WATCHER_POLL)
            .unwrap();
        guard = g;
        if *guard {
            break;
        }

        let now = Instant::now();
        if now >= next_snapshot {
            drop(guard);
            let copy = framebuffer.lock().unwrap().clone();
            debug!(
                "snapshot at {:.1}s, {}/{} tiles",
                start.elapsed().as_secs_f32(),
                completed_tiles.load(Ordering::Relaxed),
                total_tiles
            );
            on_snapshot(&copy);
            while next_snapshot <= now {
                next_snapshot += interval;
            }
            guard = finished.lock().unwrap();
        }

        if now >= deadline && !stop.load(Ordering::Acquire) {
            warn!(
                "render time budget of {:.1}s exhausted, stopping workers",
                config.max_render_seconds
            );
            stop.store(true, Ordering::Release);
        }
    }
}
