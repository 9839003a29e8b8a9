use crate::raytracer::error::RenderError;
use std::path::PathBuf;

/// Render parameters. `worker_count == 0` means one worker per hardware
/// thread as reported by the platform.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Samples per sub-pixel cell; a pixel receives
    /// `samples_per_pixel * sub_samples^2` primary rays.
    pub samples_per_pixel: u32,
    /// Side of the regular sub-pixel grid.
    pub sub_samples: u32,
    pub max_bounce: u32,
    pub worker_count: usize,
    pub max_render_seconds: f32,
    pub snapshot_interval_seconds: f32,
    pub output_dir: PathBuf,
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            samples_per_pixel: 512,
            sub_samples: 2,
            max_bounce: 16,
            worker_count: 0,
            max_render_seconds: 294.0,
            snapshot_interval_seconds: 29.9,
            output_dir: PathBuf::from("img"),
            seed: 0,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "image dimensions must be nonzero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(RenderError::InvalidConfig(
                "samples_per_pixel must be at least 1".into(),
            ));
        }
        if self.sub_samples == 0 {
            return Err(RenderError::InvalidConfig(
                "sub_samples must be at least 1".into(),
            ));
        }
        if self.max_bounce == 0 {
            return Err(RenderError::InvalidConfig(
                "max_bounce must be at least 1".into(),
            ));
        }
        if !(self.max_render_seconds > 0.0) {
            return Err(RenderError::InvalidConfig(
                "max_render_seconds must be positive".into(),
            ));
        }
        if !(self.snapshot_interval_seconds > 0.0) {
            return Err(RenderError::InvalidConfig(
                "snapshot_interval_seconds must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Worker count with the platform probe applied.
    pub fn resolved_workers(&self) -> usize {
        if self.worker_count > 0 {
            self.worker_count
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}
