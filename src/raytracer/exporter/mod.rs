mod png;
mod tonemapping;

pub use png::PngExporter;
pub use tonemapping::{linear_to_srgb_u8, ToneMap};

use crate::raytracer::framebuffer::Framebuffer;
use std::path::Path;

/// Writes a linear-RGB framebuffer to disk. Everything downstream of the
/// radiance buffer — gamma, tone mapping, container format — lives
/// behind this seam.
pub trait Exporter {
    fn export(&self, framebuffer: &Framebuffer, path: &Path) -> image::ImageResult<()>;
}

/// File name for a periodic snapshot, e.g. `frame_20250214_153034.png`.
pub fn snapshot_filename() -> String {
    format!("frame_{}.png", timestamp())
}

/// File name for the final image, e.g. `output_20250214_153034.png`.
pub fn output_filename() -> String {
    format!("output_{}.png", timestamp())
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
