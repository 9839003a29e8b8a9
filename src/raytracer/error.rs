use std::path::PathBuf;

/// Fatal render failures. Snapshot write errors are deliberately absent:
/// a missed snapshot is logged and the render keeps going, while these
/// abort it with a nonzero exit status.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("scene contains no primitives")]
    EmptyScene,

    #[error("scene references material {index} but only {count} materials were supplied")]
    MaterialIndex { index: u32, count: usize },

    #[error("scene references texture {index} but only {count} textures were supplied")]
    TextureIndex { index: u32, count: usize },

    #[error("cannot allocate a {width}x{height} image buffer")]
    BufferAllocation { width: u32, height: u32 },

    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to write image: {0}")]
    ImageWrite(#[from] image::ImageError),
}
