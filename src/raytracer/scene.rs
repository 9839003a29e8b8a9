use crate::raytracer::accel::Bvh;
use crate::raytracer::camera::Camera;
use crate::raytracer::error::RenderError;
use crate::raytracer::material::Material;
use crate::raytracer::ray::{HitRecord, Ray};
use crate::raytracer::shape::Primitive;
use crate::raytracer::texture::{Texture, TextureSampler};
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// What a scene loader hands the core: ordered primitives (each carrying
/// a material index), the material and texture arenas those indices
/// resolve into, an optional equirectangular environment image, and the
/// camera. No file format parsing happens on this side of the contract.
pub struct SceneDesc {
    pub primitives: Vec<Primitive>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub environment: Option<Texture>,
    pub camera: Camera,
}

/// The immutable scene. Built once, then shared by reference across all
/// workers; nothing in here mutates during rendering.
pub struct Scene {
    primitives: Vec<Primitive>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
    environment: Option<Texture>,
    environment_sampler: TextureSampler,
    bvh: Bvh,
    pub camera: Camera,
}

impl Scene {
    pub fn build(desc: SceneDesc) -> Result<Self, RenderError> {
        if desc.primitives.is_empty() {
            return Err(RenderError::EmptyScene);
        }

        for primitive in &desc.primitives {
            let index = primitive.material();
            if index as usize >= desc.materials.len() {
                return Err(RenderError::MaterialIndex {
                    index,
                    count: desc.materials.len(),
                });
            }
        }
        for material in &desc.materials {
            if let Some(index) = material.texture {
                if index as usize >= desc.textures.len() {
                    return Err(RenderError::TextureIndex {
                        index,
                        count: desc.textures.len(),
                    });
                }
            }
        }

        let bvh = Bvh::over(&desc.primitives);

        Ok(Scene {
            primitives: desc.primitives,
            materials: desc.materials,
            textures: desc.textures,
            environment: desc.environment,
            environment_sampler: TextureSampler::default(),
            bvh,
            camera: desc.camera,
        })
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Nearest hit along the ray, or `None` when it escapes the scene.
    pub fn hit(&self, ray: &Ray) -> Option<HitRecord> {
        self.bvh.traverse_closest(ray, |index, ray| {
            let primitive = &self.primitives[index as usize];
            primitive.hit(ray, ray.t_max).map(|hit| {
                (
                    hit.t,
                    HitRecord {
                        t: hit.t,
                        position: hit.position,
                        normal: hit.normal,
                        uv: hit.uv,
                        primitive: index,
                        material: primitive.material(),
                    },
                )
            })
        })
    }

    pub fn material(&self, index: u32) -> &Material {
        &self.materials[index as usize]
    }

    /// Texture color under a material at `uv`; white when untextured.
    pub fn texel(&self, material: &Material, uv: Vec2) -> Vec3 {
        match material.texture {
            Some(index) => self.textures[index as usize].sample(&material.sampler, uv),
            None => Vec3::ONE,
        }
    }

    /// Environment radiance for an escaped ray; black when no
    /// environment image is configured.
    pub fn environment(&self, direction: Vec3) -> Vec3 {
        let Some(environment) = &self.environment else {
            return Vec3::ZERO;
        };
        let uv = Vec2::new(
            0.5 + direction.z.atan2(direction.x) / TAU,
            0.5 - direction.y.clamp(-1.0, 1.0).asin() / PI,
        );
        environment.sample(&self.environment_sampler, uv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raytracer::rng::Pcg32;

    fn test_camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y, 64, 64, 0.5, 1.0)
    }

    fn sphere(center: Vec3, radius: f32, material: u32) -> Primitive {
        Primitive::Sphere { center, radius, material }
    }

    #[test]
    fn empty_scene_is_rejected() {
        let desc = SceneDesc {
            primitives: vec![],
            materials: vec![Material::matte(Vec3::ONE)],
            textures: vec![],
            environment: None,
            camera: test_camera(),
        };
        assert!(matches!(Scene::build(desc), Err(RenderError::EmptyScene)));
    }

    #[test]
    fn dangling_material_index_is_rejected() {
        let desc = SceneDesc {
            primitives: vec![sphere(Vec3::ZERO, 1.0, 2)],
            materials: vec![Material::matte(Vec3::ONE)],
            textures: vec![],
            environment: None,
            camera: test_camera(),
        };
        assert!(matches!(
            Scene::build(desc),
            Err(RenderError::MaterialIndex { index: 2, count: 1 })
        ));
    }

    #[test]
    fn dangling_texture_index_is_rejected() {
        let desc = SceneDesc {
            primitives: vec![sphere(Vec3::ZERO, 1.0, 0)],
            materials: vec![
                Material::matte(Vec3::ONE).with_texture(0, TextureSampler::default()),
            ],
            textures: vec![],
            environment: None,
            camera: test_camera(),
        };
        assert!(matches!(
            Scene::build(desc),
            Err(RenderError::TextureIndex { index: 0, count: 0 })
        ));
    }

    #[test]
    fn hit_resolves_primitive_and_material_indices() {
        let desc = SceneDesc {
            primitives: vec![
                sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, 1),
                sphere(Vec3::new(0.0, 0.0, -9.0), 1.0, 0),
            ],
            materials: vec![Material::matte(Vec3::ONE), Material::mirror(Vec3::ONE)],
            textures: vec![],
            environment: None,
            camera: test_camera(),
        };
        let scene = Scene::build(desc).unwrap();
        let hit = scene.hit(&Ray::new(Vec3::ZERO, -Vec3::Z)).unwrap();
        assert_eq!(hit.primitive, 0);
        assert_eq!(hit.material, 1);
        assert!((hit.t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn scene_query_matches_brute_force() {
        let mut rng = Pcg32::new(31);
        let primitives: Vec<Primitive> = (0..300)
            .map(|_| {
                sphere(
                    Vec3::new(rng.next(), rng.next(), rng.next()) * 60.0,
                    0.3 + rng.next(),
                    0,
                )
            })
            .collect();
        let desc = SceneDesc {
            primitives: primitives.clone(),
            materials: vec![Material::matte(Vec3::ONE)],
            textures: vec![],
            environment: None,
            camera: test_camera(),
        };
        let scene = Scene::build(desc).unwrap();

        for _ in 0..200 {
            let origin =
                Vec3::new(rng.next(), rng.next(), rng.next()) * 120.0 - Vec3::splat(30.0);
            let target = Vec3::new(rng.next(), rng.next(), rng.next()) * 60.0;
            let ray = Ray::new(origin, (target - origin).normalize());

            let brute = primitives
                .iter()
                .filter_map(|p| p.hit(&ray, f32::INFINITY))
                .map(|h| h.t)
                .fold(f32::INFINITY, f32::min);
            let queried = scene.hit(&ray).map_or(f32::INFINITY, |h| h.t);

            if brute.is_infinite() {
                assert!(queried.is_infinite());
            } else {
                assert!(
                    (brute - queried).abs() <= 1e-5 * brute.max(1.0),
                    "brute {brute} vs bvh {queried}"
                );
            }
        }
    }

    #[test]
    fn texel_defaults_to_white() {
        let desc = SceneDesc {
            primitives: vec![sphere(Vec3::ZERO, 1.0, 0)],
            materials: vec![Material::matte(Vec3::splat(0.5))],
            textures: vec![],
            environment: None,
            camera: test_camera(),
        };
        let scene = Scene::build(desc).unwrap();
        let material = scene.material(0);
        assert_eq!(scene.texel(material, Vec2::new(0.3, 0.7)), Vec3::ONE);
    }

    #[test]
    fn missing_environment_is_black() {
        let desc = SceneDesc {
            primitives: vec![sphere(Vec3::ZERO, 1.0, 0)],
            materials: vec![Material::matte(Vec3::ONE)],
            textures: vec![],
            environment: None,
            camera: test_camera(),
        };
        let scene = Scene::build(desc).unwrap();
        assert_eq!(scene.environment(Vec3::Y), Vec3::ZERO);
    }

    #[test]
    fn environment_samples_by_direction() {
        let desc = SceneDesc {
            primitives: vec![sphere(Vec3::ZERO, 1.0, 0)],
            materials: vec![Material::matte(Vec3::ONE)],
            textures: vec![],
            environment: Some(Texture::solid(Vec3::new(0.1, 0.2, 0.3))),
            camera: test_camera(),
        };
        let scene = Scene::build(desc).unwrap();
        assert_eq!(scene.environment(Vec3::X), Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(scene.environment(-Vec3::Y), Vec3::new(0.1, 0.2, 0.3));
    }
}
