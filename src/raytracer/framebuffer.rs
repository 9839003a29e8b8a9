use crate::raytracer::error::RenderError;
use glam::Vec3;

/// Shared accumulation target: per-pixel radiance sums plus the number
/// of primary rays folded into each sum. The displayed value of a pixel
/// is always `sum / count`.
#[derive(Clone)]
pub struct Framebuffer {
    sum: Vec<Vec3>,
    counts: Vec<u32>,
    width: u32,
    height: u32,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RenderError::BufferAllocation { width, height })?;

        let mut sum = Vec::new();
        let mut counts = Vec::new();
        if sum.try_reserve_exact(len).is_err() || counts.try_reserve_exact(len).is_err() {
            return Err(RenderError::BufferAllocation { width, height });
        }
        sum.resize(len, Vec3::ZERO);
        counts.resize(len, 0u32);

        Ok(Self { sum, counts, width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Folds a finished tile into the shared buffer. `tile_sums` holds
    /// one radiance sum per tile pixel in scan order, each accumulated
    /// over `samples` primary rays.
    pub fn merge_tile(
        &mut self,
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
        tile_sums: &[Vec3],
        samples: u32,
    ) {
        debug_assert!(x1 <= self.width && y1 <= self.height);
        debug_assert_eq!(tile_sums.len(), ((x1 - x0) * (y1 - y0)) as usize);

        let tile_width = (x1 - x0) as usize;
        for y in y0..y1 {
            let row = (y * self.width + x0) as usize;
            let tile_row = ((y - y0) as usize) * tile_width;
            for x in 0..tile_width {
                self.sum[row + x] += tile_sums[tile_row + x];
                self.counts[row + x] += samples;
            }
        }
    }

    #[allow(dead_code)]
    pub fn sample_count(&self, x: u32, y: u32) -> u32 {
        self.counts[(y * self.width + x) as usize]
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec3 {
        let index = (y * self.width + x) as usize;
        if self.counts[index] == 0 {
            Vec3::ZERO
        } else {
            self.sum[index] / self.counts[index] as f32
        }
    }

    /// Mean radiance per pixel, scan order. Pixels no tile has reached
    /// yet come out black, which is what snapshots want.
    pub fn to_color_buffer(&self) -> Vec<Vec3> {
        self.sum
            .iter()
            .zip(&self.counts)
            .map(|(&sum, &count)| {
                if count == 0 {
                    Vec3::ZERO
                } else {
                    sum / count as f32
                }
            })
            .collect()
    }

    pub fn total_samples(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn mean_luminance(&self) -> f32 {
        let colors = self.to_color_buffer();
        let lum: f32 = colors
            .iter()
            .map(|c| 0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z)
            .sum();
        lum / colors.len() as f32
    }
}
