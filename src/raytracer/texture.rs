use glam::{Vec2, Vec3};

/// Behavior for coordinates outside [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressMode {
    /// Coordinate modulo 1; the image tiles.
    Wrap,
    /// Saturate to the edge texel.
    Clamp,
    /// Out-of-range lookups return the sampler's border color.
    Border,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Bilinear,
}

/// How a texture is fetched. Materials own their sampler, so the same
/// image can tile on one surface and clamp on another.
#[derive(Clone, Copy)]
pub struct TextureSampler {
    pub address: AddressMode,
    pub filter: FilterMode,
    pub border: Vec3,
}

impl Default for TextureSampler {
    fn default() -> Self {
        Self {
            address: AddressMode::Wrap,
            filter: FilterMode::Bilinear,
            border: Vec3::ZERO,
        }
    }
}

/// Immutable 2D image: `channels` interleaved f32 components per pixel,
/// rows top to bottom.
#[derive(Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    channels: u32,
    pixels: Vec<f32>,
}

impl Texture {
    pub fn new(width: u32, height: u32, channels: u32, pixels: Vec<f32>) -> Self {
        assert!(width > 0 && height > 0);
        assert!(matches!(channels, 1 | 3 | 4));
        assert_eq!(pixels.len(), (width * height * channels) as usize);
        Self { width, height, channels, pixels }
    }

    pub fn solid(color: Vec3) -> Self {
        Self::new(1, 1, 3, vec![color.x, color.y, color.z])
    }

    #[allow(dead_code)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[allow(dead_code)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[allow(dead_code)]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Fetches one texel, applying the sampler's address mode to integer
    /// coordinates that fall outside the image.
    fn texel(&self, x: i64, y: i64, sampler: &TextureSampler) -> Vec3 {
        let (w, h) = (self.width as i64, self.height as i64);
        let (x, y) = match sampler.address {
            AddressMode::Wrap => (x.rem_euclid(w), y.rem_euclid(h)),
            AddressMode::Clamp => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
            AddressMode::Border => {
                if x < 0 || x >= w || y < 0 || y >= h {
                    return sampler.border;
                }
                (x, y)
            }
        };

        let base = ((y as u32 * self.width + x as u32) * self.channels) as usize;
        match self.channels {
            1 => Vec3::splat(self.pixels[base]),
            _ => Vec3::new(
                self.pixels[base],
                self.pixels[base + 1],
                self.pixels[base + 2],
            ),
        }
    }

    /// Samples at `uv`, with (0,0) the top-left corner; v is flipped
    /// before row indexing.
    pub fn sample(&self, sampler: &TextureSampler, uv: Vec2) -> Vec3 {
        if sampler.address == AddressMode::Border
            && (!(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y))
        {
            return sampler.border;
        }

        let u = uv.x;
        let v = 1.0 - uv.y;
        match sampler.filter {
            FilterMode::Nearest => {
                let x = (u * self.width as f32).floor() as i64;
                let y = (v * self.height as f32).floor() as i64;
                self.texel(x, y, sampler)
            }
            FilterMode::Bilinear => {
                let px = u * self.width as f32 - 0.5;
                let py = v * self.height as f32 - 0.5;
                let x0 = px.floor() as i64;
                let y0 = py.floor() as i64;
                let fx = px - px.floor();
                let fy = py - py.floor();

                let c00 = self.texel(x0, y0, sampler);
                let c10 = self.texel(x0 + 1, y0, sampler);
                let c01 = self.texel(x0, y0 + 1, sampler);
                let c11 = self.texel(x0 + 1, y0 + 1, sampler);

                let top = c00.lerp(c10, fx);
                let bottom = c01.lerp(c11, fx);
                top.lerp(bottom, fy)
            }
        }
    }
}
