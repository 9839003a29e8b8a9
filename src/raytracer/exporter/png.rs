use super::{linear_to_srgb_u8, Exporter, ToneMap};
use crate::raytracer::framebuffer::Framebuffer;
use image::{ImageBuffer, Rgb};
use std::path::Path;

/// PNG writer: averages the accumulation buffer, tone maps, and encodes
/// through the sRGB transfer curve.
pub struct PngExporter {
    tonemap: ToneMap,
}

impl PngExporter {
    pub fn new(tonemap: ToneMap) -> Self {
        Self { tonemap }
    }
}

impl Exporter for PngExporter {
    fn export(&self, framebuffer: &Framebuffer, path: &Path) -> image::ImageResult<()> {
        let width = framebuffer.width();
        let colors = framebuffer.to_color_buffer();
        let img = ImageBuffer::from_fn(width, framebuffer.height(), |x, y| {
            let color = colors[(y * width + x) as usize];
            Rgb(linear_to_srgb_u8(self.tonemap.apply(color)))
        });
        img.save(path)
    }
}
