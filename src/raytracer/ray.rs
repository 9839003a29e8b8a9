use glam::{Vec2, Vec3};

/// Self-intersection guard for continuation rays and primitive hits.
pub const RAY_EPSILON: f32 = 1e-4;

/// A ray with its reciprocal direction and per-axis sign bits precomputed.
/// Both are derived from `direction` at construction and never patched
/// afterwards; a new direction means a new `Ray`.
#[derive(Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub inv_direction: Vec3,
    /// 1 where the direction component is negative, 0 otherwise.
    pub sign: [usize; 3],
    pub t_min: f32,
    pub t_max: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        // IEEE division yields the +/-inf sentinel for zero components.
        let inv_direction = Vec3::new(
            1.0 / direction.x,
            1.0 / direction.y,
            1.0 / direction.z,
        );
        Ray {
            origin,
            direction,
            inv_direction,
            sign: [
                (direction.x < 0.0) as usize,
                (direction.y < 0.0) as usize,
                (direction.z < 0.0) as usize,
            ],
            t_min: RAY_EPSILON,
            t_max: f32::INFINITY,
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Where a ray met the scene. Primitive and material are arena indices;
/// they are only resolved when the integrator needs them.
#[derive(Clone, Copy)]
pub struct HitRecord {
    pub t: f32,
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub primitive: u32,
    pub material: u32,
}
