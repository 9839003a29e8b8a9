mod raytracer;

use clap::{Parser, ValueEnum};
use glam::{Vec2, Vec3};
use log::{error, info, warn, LevelFilter};
use raytracer::camera::Camera;
use raytracer::config::RenderConfig;
use raytracer::error::RenderError;
use raytracer::exporter::{output_filename, snapshot_filename, Exporter, PngExporter, ToneMap};
use raytracer::material::Material;
use raytracer::renderer::PathTracer;
use raytracer::renderloop::TiledRenderLoop;
use raytracer::scene::{Scene, SceneDesc};
use raytracer::shape::{Primitive, Quad, Triangle};
use raytracer::texture::{AddressMode, FilterMode, Texture, TextureSampler};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ToneMapArg {
    None,
    Reinhard,
}

impl From<ToneMapArg> for ToneMap {
    fn from(arg: ToneMapArg) -> Self {
        match arg {
            ToneMapArg::None => ToneMap::None,
            ToneMapArg::Reinhard => ToneMap::Reinhard,
        }
    }
}

#[derive(Parser)]
#[command(name = "pathlight")]
#[command(about = "Offline tile-parallel Monte Carlo path tracer")]
struct Args {
    /// Image width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Samples per sub-pixel cell
    #[arg(long, short = 's', default_value_t = 512)]
    samples_per_pixel: u32,

    /// Side of the stratified sub-pixel grid
    #[arg(long, default_value_t = 2)]
    sub_samples: u32,

    /// Path termination depth
    #[arg(long, default_value_t = 16)]
    max_bounce: u32,

    /// Worker threads; 0 uses one per hardware thread
    #[arg(long, short = 'w', default_value_t = 0)]
    workers: usize,

    /// Wall-clock render budget in seconds
    #[arg(long, default_value_t = 294.0)]
    max_render_seconds: f32,

    /// Seconds between preview snapshots
    #[arg(long, default_value_t = 29.9)]
    snapshot_interval: f32,

    /// Directory for snapshots and the final image
    #[arg(long, short = 'o', default_value = "img")]
    output_dir: PathBuf,

    /// Global random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Tone map applied on export
    #[arg(long, value_enum, default_value = "reinhard")]
    tonemap: ToneMapArg,

    /// Logging verbosity
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), RenderError> {
    let config = RenderConfig {
        width: args.width,
        height: args.height,
        samples_per_pixel: args.samples_per_pixel,
        sub_samples: args.sub_samples,
        max_bounce: args.max_bounce,
        worker_count: args.workers,
        max_render_seconds: args.max_render_seconds,
        snapshot_interval_seconds: args.snapshot_interval,
        output_dir: args.output_dir.clone(),
        seed: args.seed,
    };
    config.validate()?;

    std::fs::create_dir_all(&config.output_dir).map_err(|e| RenderError::OutputDir {
        path: config.output_dir.clone(),
        source: e,
    })?;

    info!("pathlight {}", env!("CARGO_PKG_VERSION"));
    info!(
        "configuration: {}x{}, {} samples x {}x{} sub-samples, {} bounces",
        config.width,
        config.height,
        config.samples_per_pixel,
        config.sub_samples,
        config.sub_samples,
        config.max_bounce
    );

    let scene = Scene::build(demo_scene(config.width, config.height))?;
    info!("scene: {} primitives", scene.primitives().len());

    let renderer = PathTracer::new(config.max_bounce);
    let render_loop = TiledRenderLoop::new(config.resolved_workers())?;
    let png = PngExporter::new(args.tonemap.into());

    let snapshot_dir = config.output_dir.clone();
    let (framebuffer, stats) = render_loop.render(&scene, &renderer, &config, |fb| {
        let path = snapshot_dir.join(snapshot_filename());
        match png.export(fb, &path) {
            Ok(()) => info!("wrote snapshot {}", path.display()),
            Err(e) => warn!("snapshot write failed: {e}"),
        }
    })?;

    let out_path = config.output_dir.join(output_filename());
    png.export(&framebuffer, &out_path)?;

    let seconds = stats.elapsed.as_secs_f64();
    let pixels = (config.width * config.height) as f64;
    info!("wrote {}", out_path.display());
    info!(
        "render time {:.2}s ({:.2} min), {:.4} ms per pixel",
        seconds,
        seconds / 60.0,
        seconds * 1000.0 / pixels
    );
    info!(
        "{:.1} samples per pixel on average, mean luminance {:.4}",
        framebuffer.total_samples() as f64 / pixels,
        framebuffer.mean_luminance()
    );
    if stats.aborted {
        warn!(
            "time budget hit: {}/{} tiles completed",
            stats.completed_tiles, stats.total_tiles
        );
    }
    if stats.discarded_samples > 0 {
        warn!(
            "discarded {} non-finite samples",
            stats.discarded_samples
        );
    }

    Ok(())
}

/// Procedural gray checkerboard used by the floor.
fn checker_texture() -> Texture {
    let size = 8u32;
    let mut pixels = Vec::with_capacity((size * size * 3) as usize);
    for y in 0..size {
        for x in 0..size {
            let value = if (x + y) % 2 == 0 { 0.9 } else { 0.35 };
            pixels.extend_from_slice(&[value, value, value]);
        }
    }
    Texture::new(size, size, 3, pixels)
}

/// The demo scene: a 100 x 100 x 250 closed box holding a mirror ball,
/// a crystal ball, a clay ball, a glossy triangle, and a spherical
/// ceiling light.
fn demo_scene(width: u32, height: u32) -> SceneDesc {
    const WHITE: u32 = 0;
    const FLOOR: u32 = 1;
    const LIGHT: u32 = 2;
    const MIRROR: u32 = 3;
    const GLOSSY: u32 = 4;
    const CRYSTAL: u32 = 5;
    const CLAY: u32 = 6;

    let tiling = TextureSampler {
        address: AddressMode::Wrap,
        filter: FilterMode::Bilinear,
        border: Vec3::ZERO,
    };

    let materials = vec![
        Material::matte(Vec3::splat(0.75)),
        Material::matte(Vec3::splat(0.75)).with_texture(0, tiling),
        Material::matte(Vec3::ZERO).with_emissive(Vec3::splat(36.0)),
        Material::mirror(Vec3::new(0.25, 0.25, 0.75)),
        Material::glossy(Vec3::new(0.75, 0.75, 0.25), 100.0),
        Material::dielectric(Vec3::new(0.75, 0.25, 0.25), 1.54),
        Material::rough_diffuse(Vec3::new(0.25, 0.75, 0.25), 0.85),
    ];

    let wall_uv = [
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 2.0),
        Vec2::new(2.0, 2.0),
        Vec2::new(2.0, 0.0),
    ];
    let floor_uv = [
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 3.0),
        Vec2::new(3.0, 3.0),
        Vec2::new(3.0, 0.0),
    ];

    let quad = |p: [Vec3; 4], uv: [Vec2; 4], material: u32| {
        Primitive::Quad(Quad::flat(
            p[0], p[1], p[2], p[3], uv[0], uv[1], uv[2], uv[3], material,
        ))
    };

    let primitives = vec![
        // Left wall.
        quad(
            [
                Vec3::new(0.0, 0.0, 250.0),
                Vec3::new(0.0, 100.0, 250.0),
                Vec3::new(0.0, 100.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
            ],
            wall_uv,
            WHITE,
        ),
        // Back wall.
        quad(
            [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 100.0, 0.0),
                Vec3::new(100.0, 100.0, 0.0),
                Vec3::new(100.0, 0.0, 0.0),
            ],
            wall_uv,
            WHITE,
        ),
        // Front wall, behind the camera.
        quad(
            [
                Vec3::new(100.0, 0.0, 250.0),
                Vec3::new(100.0, 100.0, 250.0),
                Vec3::new(0.0, 100.0, 250.0),
                Vec3::new(0.0, 0.0, 250.0),
            ],
            wall_uv,
            WHITE,
        ),
        // Right wall.
        quad(
            [
                Vec3::new(100.0, 0.0, 0.0),
                Vec3::new(100.0, 100.0, 0.0),
                Vec3::new(100.0, 100.0, 250.0),
                Vec3::new(100.0, 0.0, 250.0),
            ],
            wall_uv,
            WHITE,
        ),
        // Ceiling.
        quad(
            [
                Vec3::new(100.0, 100.0, 250.0),
                Vec3::new(100.0, 100.0, 0.0),
                Vec3::new(0.0, 100.0, 0.0),
                Vec3::new(0.0, 100.0, 250.0),
            ],
            wall_uv,
            WHITE,
        ),
        // Checkered floor.
        quad(
            [
                Vec3::new(0.0, 0.0, 250.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(100.0, 0.0, 0.0),
                Vec3::new(100.0, 0.0, 250.0),
            ],
            floor_uv,
            FLOOR,
        ),
        Primitive::Sphere {
            center: Vec3::new(20.0, 16.5, 27.0),
            radius: 16.5,
            material: MIRROR,
        },
        Primitive::Sphere {
            center: Vec3::new(77.0, 16.5, 78.0),
            radius: 16.5,
            material: CRYSTAL,
        },
        Primitive::Sphere {
            center: Vec3::new(55.0, 10.0, 140.0),
            radius: 10.0,
            material: CLAY,
        },
        Primitive::Sphere {
            center: Vec3::new(50.0, 100.0, 81.6),
            radius: 15.0,
            material: LIGHT,
        },
        Primitive::Triangle(Triangle::flat(
            Vec3::new(70.0, 50.0, 20.0),
            Vec3::new(50.0, 80.0, 10.0),
            Vec3::new(30.0, 50.0, 20.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(0.5, 1.0),
            Vec2::new(1.0, 0.0),
            GLOSSY,
        )),
    ];

    SceneDesc {
        primitives,
        materials,
        textures: vec![checker_texture()],
        environment: None,
        camera: Camera::new(
            Vec3::new(50.0, 52.0, 220.0),
            Vec3::new(50.0, 50.0, 180.0),
            Vec3::Y,
            width,
            height,
            std::f32::consts::FRAC_PI_4,
            1.0,
        ),
    }
}
