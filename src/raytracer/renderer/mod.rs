mod pathtracer;

pub use pathtracer::PathTracer;

use crate::raytracer::ray::Ray;
use crate::raytracer::rng::Pcg32;
use crate::raytracer::scene::Scene;
use glam::Vec3;

/// Per-ray radiance estimator. The scheduler drives one of these from
/// many workers at once, so implementations must be stateless across
/// calls apart from the caller-owned generator.
pub trait Renderer {
    fn radiance(&self, ray: &Ray, scene: &Scene, rng: &mut Pcg32) -> Vec3;
}
