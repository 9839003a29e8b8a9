use super::Renderer;
use crate::raytracer::ray::{Ray, RAY_EPSILON};
use crate::raytracer::rng::Pcg32;
use crate::raytracer::sampling::face_forward;
use crate::raytracer::scene::Scene;
use glam::Vec3;

/// Floor of the roulette continuation probability before depth
/// attenuation; also the division guard for the throughput update.
const PROB_MIN: f32 = 1e-4;

/// Unidirectional path-tracing integrator. Expands the rendering
/// equation iteratively: radiance picks up `throughput * emission` at
/// every vertex while the throughput accumulates the sampling weights,
/// and Russian roulette decides when the path stops paying for itself.
pub struct PathTracer {
    max_bounce: u32,
}

impl PathTracer {
    pub fn new(max_bounce: u32) -> Self {
        Self { max_bounce }
    }
}

impl Renderer for PathTracer {
    fn radiance(&self, primary: &Ray, scene: &Scene, rng: &mut Pcg32) -> Vec3 {
        let mut throughput = Vec3::ONE;
        let mut radiance = Vec3::ZERO;
        let mut ray = *primary;

        for depth in 0..self.max_bounce {
            let Some(hit) = scene.hit(&ray) else {
                radiance += throughput * scene.environment(ray.direction);
                break;
            };

            let material = scene.material(hit.material);
            let texel = scene.texel(material, hit.uv);
            radiance += throughput * material.emission(texel);

            let albedo = material.reflectance * texel;

            // Continuation probability from the surface reflectivity,
            // halved per bounce once the path passes half its budget.
            let mut probability = albedo.max_element().clamp(PROB_MIN, 0.99);
            if depth >= self.max_bounce / 2 {
                probability *= 0.5f32.powi((depth - self.max_bounce / 2) as i32);
            }
            if rng.next() >= probability {
                break;
            }

            let scatter = material.sample(ray.direction, hit.normal, albedo, rng);
            throughput *= scatter.weight / probability.max(PROB_MIN * PROB_MIN);

            if !throughput.is_finite() {
                break;
            }
            if throughput.max_element() <= 0.0 {
                break;
            }

            // Continue from just off the surface, on whichever side the
            // scattered direction leaves through.
            let n_s = face_forward(hit.normal, ray.direction);
            let offset = if scatter.direction.dot(n_s) < 0.0 { -n_s } else { n_s };
            ray = Ray::new(hit.position + offset * RAY_EPSILON, scatter.direction);
        }

        radiance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raytracer::camera::Camera;
    use crate::raytracer::material::Material;
    use crate::raytracer::scene::{Scene, SceneDesc};
    use crate::raytracer::shape::{Primitive, Quad, Triangle};
    use crate::raytracer::texture::Texture;
    use glam::Vec2;

    fn build(
        primitives: Vec<Primitive>,
        materials: Vec<Material>,
        environment: Option<Texture>,
        camera: Camera,
    ) -> Scene {
        Scene::build(SceneDesc {
            primitives,
            materials,
            textures: vec![],
            environment,
            camera,
        })
        .unwrap()
    }

    fn facing_quad_at(z: f32, material: u32) -> Primitive {
        Primitive::Quad(Quad::flat(
            Vec3::new(-10.0, -10.0, z),
            Vec3::new(10.0, -10.0, z),
            Vec3::new(10.0, 10.0, z),
            Vec3::new(-10.0, 10.0, z),
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ZERO,
            material,
        ))
    }

    #[test]
    fn single_triangle_scene_stays_finite() {
        let camera = Camera::new(
            Vec3::new(0.0, 0.5, 2.0),
            Vec3::ZERO,
            Vec3::Y,
            32,
            32,
            std::f32::consts::FRAC_PI_4,
            1.0,
        );
        let scene = build(
            vec![Primitive::Triangle(Triangle::flat(
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec2::ZERO,
                Vec2::new(1.0, 0.0),
                Vec2::new(0.5, 1.0),
                0,
            ))],
            vec![Material::matte(Vec3::ONE)],
            None,
            camera.clone(),
        );

        let tracer = PathTracer::new(16);
        let mut rng = Pcg32::new(1);
        for i in 0..32 {
            for j in 0..32 {
                let ray = camera.primary_ray(i as f32 / 32.0, j as f32 / 32.0);
                let l = tracer.radiance(&ray, &scene, &mut rng);
                assert!(l.is_finite(), "pixel ({i},{j}) produced {l}");
                assert!(l.min_element() >= 0.0);
            }
        }
    }

    #[test]
    fn directly_visible_emitter_returns_its_radiance() {
        let camera = Camera::new(Vec3::ZERO, -Vec3::Z, Vec3::Y, 16, 16, 0.5, 1.0);
        let emission = Vec3::new(36.0, 36.0, 36.0);
        let scene = build(
            vec![facing_quad_at(-5.0, 0)],
            vec![Material::matte(Vec3::ZERO).with_emissive(emission)],
            None,
            camera.clone(),
        );

        let tracer = PathTracer::new(16);
        let mut rng = Pcg32::new(2);
        let ray = camera.primary_ray(0.5, 0.5);
        // Zero reflectance kills every continuation, so the estimate is
        // exactly the emitted radiance.
        for _ in 0..50 {
            let l = tracer.radiance(&ray, &scene, &mut rng);
            assert!((l - emission).length() < 1e-3, "got {l}");
        }
    }

    #[test]
    fn escaped_rays_pick_up_the_environment() {
        let camera = Camera::new(Vec3::ZERO, -Vec3::Z, Vec3::Y, 16, 16, 0.5, 1.0);
        let scene = build(
            vec![Primitive::Sphere {
                center: Vec3::new(0.0, 500.0, 0.0),
                radius: 1.0,
                material: 0,
            }],
            vec![Material::matte(Vec3::ONE)],
            Some(Texture::solid(Vec3::new(0.25, 0.5, 0.75))),
            camera.clone(),
        );

        let tracer = PathTracer::new(4);
        let mut rng = Pcg32::new(3);
        let l = tracer.radiance(&camera.primary_ray(0.5, 0.5), &scene, &mut rng);
        assert!((l - Vec3::new(0.25, 0.5, 0.75)).length() < 1e-5);
    }

    #[test]
    fn mirror_carries_light_around_a_corner() {
        // Camera looks down -z at a 45-degree mirror that redirects the
        // view up to an emitter overhead.
        let camera = Camera::new(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO, Vec3::Y, 16, 16, 0.2, 1.0);
        let emission = Vec3::splat(36.0);
        let mirror = Primitive::Quad(Quad::flat(
            Vec3::new(-2.0, -2.0, 2.0),
            Vec3::new(2.0, -2.0, 2.0),
            Vec3::new(2.0, 2.0, -2.0),
            Vec3::new(-2.0, 2.0, -2.0),
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ZERO,
            0,
        ));
        let light = Primitive::Quad(Quad::flat(
            Vec3::new(-20.0, 30.0, -20.0),
            Vec3::new(20.0, 30.0, -20.0),
            Vec3::new(20.0, 30.0, 20.0),
            Vec3::new(-20.0, 30.0, 20.0),
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ZERO,
            1,
        ));
        let scene = build(
            vec![mirror, light],
            vec![
                Material::mirror(Vec3::ONE),
                Material::matte(Vec3::ZERO).with_emissive(emission),
            ],
            None,
            camera.clone(),
        );

        let tracer = PathTracer::new(8);
        let mut rng = Pcg32::new(4);
        let ray = camera.primary_ray(0.5, 0.5);
        let n = 500;
        let mut sum = Vec3::ZERO;
        for _ in 0..n {
            let l = tracer.radiance(&ray, &scene, &mut rng);
            assert!(l.is_finite());
            sum += l;
        }
        let mean = sum / n as f32;
        // Unbiasedness: roulette losses are repaid by the 1/p weight.
        assert!((mean - emission).length() < 2.0, "mean was {mean}");
    }

    #[test]
    fn parallel_mirrors_terminate_within_the_bounce_budget() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::Y, 8, 8, 0.2, 0.5);
        let scene = build(
            vec![facing_quad_at(-3.0, 0), facing_quad_at(3.0, 0)],
            vec![Material::mirror(Vec3::splat(0.9))],
            None,
            camera.clone(),
        );

        let tracer = PathTracer::new(16);
        let mut rng = Pcg32::new(5);
        for _ in 0..200 {
            let l = tracer.radiance(&camera.primary_ray(0.5, 0.5), &scene, &mut rng);
            assert!(l.is_finite());
        }
    }

    #[test]
    fn dielectric_sphere_produces_finite_estimates() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 6.0), Vec3::ZERO, Vec3::Y, 16, 16, 0.5, 1.0);
        let scene = build(
            vec![
                Primitive::Sphere {
                    center: Vec3::ZERO,
                    radius: 1.5,
                    material: 0,
                },
                facing_quad_at(-8.0, 1),
            ],
            vec![
                Material::dielectric(Vec3::new(0.75, 0.25, 0.25), 1.54),
                Material::matte(Vec3::ZERO).with_emissive(Vec3::splat(12.0)),
            ],
            None,
            camera.clone(),
        );

        let tracer = PathTracer::new(16);
        let mut rng = Pcg32::new(6);
        for i in 0..16 {
            for j in 0..16 {
                let ray = camera.primary_ray(i as f32 / 16.0, j as f32 / 16.0);
                for _ in 0..8 {
                    let l = tracer.radiance(&ray, &scene, &mut rng);
                    assert!(l.is_finite());
                    assert!(l.min_element() >= 0.0);
                }
            }
        }
    }
}
