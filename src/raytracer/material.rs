use crate::raytracer::rng::Pcg32;
use crate::raytracer::sampling::{
    face_forward, orthonormal_basis, reflect, sample_cosine_hemisphere, to_world,
};
use crate::raytracer::texture::TextureSampler;
use glam::Vec3;
use std::f32::consts::TAU;

/// The scattering law of a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Surface {
    /// Lambertian diffuse.
    Matte,
    /// Oren-Nayar diffuse with roughness sigma in radians.
    RoughDiffuse { sigma: f32 },
    /// Perfect specular reflection.
    Mirror,
    /// Specular reflection/refraction with relative index of refraction.
    Dielectric { ior: f32 },
    /// Phong lobe around the mirror direction.
    Glossy { power: f32 },
}

/// A surface variant plus its base reflectance, emission, and optional
/// texture with the sampler it is fetched through. Reflectance stays in
/// [0, 1] per component; emission is non-negative.
#[derive(Clone, Copy)]
pub struct Material {
    pub surface: Surface,
    pub reflectance: Vec3,
    pub emissive: Vec3,
    pub texture: Option<u32>,
    pub sampler: TextureSampler,
}

/// One importance-sampled continuation. `weight` already folds in the
/// BSDF, the cosine term, and the sampling pdf; the integrator only
/// divides by the roulette probability.
#[derive(Clone, Copy)]
pub struct Scatter {
    pub direction: Vec3,
    pub weight: Vec3,
    /// True when the direction came from a Dirac lobe.
    pub specular: bool,
}

impl Material {
    fn base(surface: Surface, reflectance: Vec3) -> Self {
        Self {
            surface,
            reflectance,
            emissive: Vec3::ZERO,
            texture: None,
            sampler: TextureSampler::default(),
        }
    }

    pub fn matte(reflectance: Vec3) -> Self {
        Self::base(Surface::Matte, reflectance)
    }

    pub fn rough_diffuse(reflectance: Vec3, sigma: f32) -> Self {
        Self::base(Surface::RoughDiffuse { sigma }, reflectance)
    }

    pub fn mirror(reflectance: Vec3) -> Self {
        Self::base(Surface::Mirror, reflectance)
    }

    pub fn dielectric(reflectance: Vec3, ior: f32) -> Self {
        Self::base(Surface::Dielectric { ior }, reflectance)
    }

    pub fn glossy(reflectance: Vec3, power: f32) -> Self {
        Self::base(Surface::Glossy { power }, reflectance)
    }

    pub fn with_emissive(mut self, emissive: Vec3) -> Self {
        self.emissive = emissive;
        self
    }

    pub fn with_texture(mut self, texture: u32, sampler: TextureSampler) -> Self {
        self.texture = Some(texture);
        self.sampler = sampler;
        self
    }

    /// Radiance emitted by the surface, modulated by the local texel.
    pub fn emission(&self, texel: Vec3) -> Vec3 {
        self.emissive * texel
    }

    pub fn has_delta(&self) -> bool {
        matches!(self.surface, Surface::Mirror | Surface::Dielectric { .. })
    }

    /// Importance-samples an outgoing direction. `incoming` is the unit
    /// ray direction (eye toward surface), `normal` the hit normal, and
    /// `albedo` the texture-modulated reflectance at the hit point.
    pub fn sample(&self, incoming: Vec3, normal: Vec3, albedo: Vec3, rng: &mut Pcg32) -> Scatter {
        let n_s = face_forward(normal, incoming);
        match self.surface {
            Surface::Matte => {
                let direction = cosine_direction(n_s, rng);
                Scatter {
                    direction,
                    weight: albedo,
                    specular: false,
                }
            }
            Surface::RoughDiffuse { sigma } => {
                let direction = cosine_direction(n_s, rng);
                let factor = oren_nayar(incoming, direction, n_s, sigma);
                Scatter {
                    direction,
                    weight: albedo * factor,
                    specular: false,
                }
            }
            Surface::Mirror => Scatter {
                direction: reflect(incoming, n_s).normalize(),
                weight: albedo,
                specular: true,
            },
            Surface::Dielectric { ior } => sample_dielectric(incoming, normal, n_s, ior, albedo, rng),
            Surface::Glossy { power } => {
                let axis = reflect(incoming, n_s).normalize();
                let (u, v) = orthonormal_basis(axis);
                let phi = TAU * rng.next();
                let cos_theta = (1.0 - rng.next()).powf(1.0 / (power + 1.0));
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
                let local = Vec3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta);
                let direction = to_world(local, u, v, axis).normalize();

                // The max reflectance component doubles as the lobe
                // normalization and the roulette threshold.
                let threshold = albedo.max_element().max(f32::EPSILON);
                Scatter {
                    direction,
                    weight: albedo * direction.dot(n_s) / threshold,
                    specular: false,
                }
            }
        }
    }
}

fn cosine_direction(n_s: Vec3, rng: &mut Pcg32) -> Vec3 {
    let (u, v) = orthonormal_basis(n_s);
    to_world(sample_cosine_hemisphere(rng.next(), rng.next()), u, v, n_s).normalize()
}

/// Oren-Nayar correction over the Lambert lobe.
fn oren_nayar(incoming: Vec3, outgoing: Vec3, n_s: Vec3, sigma: f32) -> f32 {
    let s2 = sigma * sigma;
    let a = 1.0 - 0.5 * s2 / (s2 + 0.33);
    let b = 0.45 * s2 / (s2 + 0.09);

    let nv = n_s.dot(incoming);
    let nl = n_s.dot(outgoing);

    let proj_in = (incoming - n_s * nv).normalize_or_zero();
    let proj_out = (outgoing - n_s * nl).normalize_or_zero();
    let cos_phi = proj_in.dot(proj_out).max(0.0);

    let theta_in = nv.clamp(-1.0, 1.0).acos();
    let theta_out = nl.clamp(-1.0, 1.0).acos();
    let alpha = theta_in.max(theta_out);
    let beta = theta_in.min(theta_out);

    a + b * cos_phi * alpha.sin() * beta.tan()
}

fn sample_dielectric(
    incoming: Vec3,
    normal: Vec3,
    n_s: Vec3,
    ior: f32,
    albedo: Vec3,
    rng: &mut Pcg32,
) -> Scatter {
    let reflected = reflect(incoming, normal).normalize();
    let entering = normal.dot(n_s) > 0.0;

    let eta = if entering { 1.0 / ior } else { ior };
    let ddn = incoming.dot(n_s);
    let cos2t = 1.0 - eta * eta * (1.0 - ddn * ddn);

    // Total internal reflection carries the full weight.
    if cos2t < 0.0 {
        return Scatter {
            direction: reflected,
            weight: albedo,
            specular: true,
        };
    }

    let orientation = if entering { 1.0 } else { -1.0 };
    let refracted =
        (incoming * eta - normal * orientation * (ddn * eta + cos2t.sqrt())).normalize();

    // Schlick's approximation of the Fresnel reflectance.
    let r0 = ((ior - 1.0) / (ior + 1.0)) * ((ior - 1.0) / (ior + 1.0));
    let c = 1.0 - if entering { -ddn } else { refracted.dot(normal) };
    let re = r0 + (1.0 - r0) * c.powi(5);
    let tr = 1.0 - re;

    let p = 0.25 + 0.5 * re;
    if rng.next() < p {
        Scatter {
            direction: reflected,
            weight: albedo * re / p,
            specular: true,
        }
    } else {
        Scatter {
            direction: refracted,
            weight: albedo * tr / (1.0 - p),
            specular: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALBEDO: Vec3 = Vec3::new(0.7, 0.5, 0.3);

    fn incoming() -> Vec3 {
        Vec3::new(0.3, -1.0, 0.1).normalize()
    }

    #[test]
    fn matte_samples_hemisphere_with_constant_weight() {
        let mat = Material::matte(ALBEDO);
        let mut rng = Pcg32::new(1);
        for _ in 0..1000 {
            let s = mat.sample(incoming(), Vec3::Y, ALBEDO, &mut rng);
            assert!(s.direction.dot(Vec3::Y) >= 0.0, "above the surface");
            assert!((s.direction.length() - 1.0).abs() < 1e-4);
            assert_eq!(s.weight, ALBEDO);
            assert!(!s.specular);
        }
        assert!(!mat.has_delta());
    }

    #[test]
    fn matte_normal_is_face_forwarded() {
        let mat = Material::matte(ALBEDO);
        let mut rng = Pcg32::new(2);
        // Hit the back side: samples must go into the lower hemisphere.
        let s = mat.sample(Vec3::Y, Vec3::Y, ALBEDO, &mut rng);
        assert!(s.direction.dot(Vec3::Y) <= 0.0);
    }

    #[test]
    fn rough_diffuse_with_zero_sigma_is_lambert() {
        let mat = Material::rough_diffuse(ALBEDO, 0.0);
        let mut rng = Pcg32::new(3);
        for _ in 0..100 {
            let s = mat.sample(incoming(), Vec3::Y, ALBEDO, &mut rng);
            assert!((s.weight - ALBEDO).length() < 1e-5);
        }
    }

    #[test]
    fn rough_diffuse_weight_stays_finite() {
        let mat = Material::rough_diffuse(ALBEDO, 0.85);
        let mut rng = Pcg32::new(4);
        for _ in 0..10_000 {
            let s = mat.sample(incoming(), Vec3::Y, ALBEDO, &mut rng);
            assert!(s.weight.is_finite());
        }
    }

    #[test]
    fn mirror_reflects_deterministically() {
        let mat = Material::mirror(ALBEDO);
        let mut rng = Pcg32::new(5);
        let d = Vec3::new(1.0, -1.0, 0.0).normalize();
        let s = mat.sample(d, Vec3::Y, ALBEDO, &mut rng);
        assert!((s.direction - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-5);
        assert_eq!(s.weight, ALBEDO);
        assert!(s.specular);
        assert!(mat.has_delta());
    }

    #[test]
    fn dielectric_normal_incidence_passes_straight_through() {
        let mat = Material::dielectric(Vec3::ONE, 1.5);
        let mut rng = Pcg32::new(6);
        let mut saw_refraction = false;
        let mut saw_reflection = false;
        for _ in 0..200 {
            let s = mat.sample(-Vec3::Z, Vec3::Z, Vec3::ONE, &mut rng);
            assert!(s.specular);
            if s.direction.z < 0.0 {
                saw_refraction = true;
                assert!((s.direction - -Vec3::Z).length() < 1e-4);
            } else {
                saw_reflection = true;
                assert!((s.direction - Vec3::Z).length() < 1e-4);
            }
        }
        assert!(saw_refraction && saw_reflection);
    }

    #[test]
    fn dielectric_expected_throughput_is_unbiased() {
        // P * (Re/P) + (1-P) * (Tr/(1-P)) = Re + Tr = 1, so the sample
        // mean of the weight must approach the albedo.
        let mat = Material::dielectric(Vec3::ONE, 1.54);
        let mut rng = Pcg32::new(7);
        let d = Vec3::new(0.4, -1.0, 0.0).normalize();
        let n = 200_000;
        let mut sum = Vec3::ZERO;
        for _ in 0..n {
            sum += mat.sample(d, Vec3::Y, Vec3::ONE, &mut rng).weight;
        }
        let mean = sum / n as f32;
        assert!((mean - Vec3::ONE).length() < 0.01, "mean was {mean}");
    }

    #[test]
    fn dielectric_grazing_exit_totally_reflects() {
        let mat = Material::dielectric(Vec3::ONE, 1.54);
        let mut rng = Pcg32::new(8);
        // Leaving the medium nearly parallel to the surface: beyond the
        // critical angle, everything reflects back inside.
        let d = Vec3::new(1.0, 0.15, 0.0).normalize();
        for _ in 0..100 {
            let s = mat.sample(d, Vec3::Y, Vec3::ONE, &mut rng);
            assert_eq!(s.weight, Vec3::ONE);
            assert!(s.direction.y < 0.0, "reflected back into the medium");
        }
    }

    #[test]
    fn glossy_concentrates_around_mirror_direction() {
        let mat = Material::glossy(ALBEDO, 1000.0);
        let mut rng = Pcg32::new(9);
        let d = Vec3::new(1.0, -1.0, 0.0).normalize();
        let mirror = Vec3::new(1.0, 1.0, 0.0).normalize();
        for _ in 0..500 {
            let s = mat.sample(d, Vec3::Y, ALBEDO, &mut rng);
            assert!(s.direction.dot(mirror) > 0.9);
            assert!(s.weight.is_finite());
            assert!(!s.specular);
        }
        assert!(!mat.has_delta());
    }

    #[test]
    fn emission_modulates_by_texel() {
        let mat = Material::matte(Vec3::ZERO).with_emissive(Vec3::new(36.0, 36.0, 36.0));
        assert_eq!(mat.emission(Vec3::ONE), Vec3::splat(36.0));
        assert_eq!(mat.emission(Vec3::new(0.5, 1.0, 0.0)), Vec3::new(18.0, 36.0, 0.0));
    }
}
