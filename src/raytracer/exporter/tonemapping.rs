use glam::Vec3;

/// Operator applied to linear radiance before the sRGB transfer curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToneMap {
    /// Clamp only.
    #[default]
    None,
    /// Reinhard: x / (1 + x).
    Reinhard,
}

impl ToneMap {
    pub fn apply(self, color: Vec3) -> Vec3 {
        match self {
            ToneMap::None => color,
            ToneMap::Reinhard => color / (color + Vec3::ONE),
        }
    }
}

pub fn linear_to_srgb_u8(color: Vec3) -> [u8; 3] {
    fn linear_to_srgb(c: f32) -> f32 {
        if c <= 0.0031308 {
            12.92 * c
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    }

    [
        (linear_to_srgb(color.x.clamp(0.0, 1.0)) * 255.0) as u8,
        (linear_to_srgb(color.y.clamp(0.0, 1.0)) * 255.0) as u8,
        (linear_to_srgb(color.z.clamp(0.0, 1.0)) * 255.0) as u8,
    ]
}
