use crate::raytracer::accel::{Aabb, Bounded};
use crate::raytracer::ray::Ray;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Determinant threshold below which a triangle is treated as parallel
/// to the ray.
const EPS_DET: f32 = 1e-8;

/// Padding applied to triangle and quad boxes so axis-aligned faces do
/// not degenerate to zero-thickness slabs.
const AABB_PADDING: f32 = 1e-5;

#[derive(Clone, Copy)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { position, normal, uv }
    }
}

#[derive(Clone, Copy)]
pub struct Triangle {
    pub v0: Vertex,
    pub v1: Vertex,
    pub v2: Vertex,
    /// Geometric face normal, precomputed at construction.
    pub normal: Vec3,
    pub material: u32,
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex, material: u32) -> Self {
        let normal = face_normal(v0.position, v1.position, v2.position);
        Self { v0, v1, v2, normal, material }
    }

    /// Triangle without authored vertex normals: every vertex carries the
    /// face normal, so interpolation reproduces flat shading.
    pub fn flat(
        p0: Vec3,
        p1: Vec3,
        p2: Vec3,
        uv0: Vec2,
        uv1: Vec2,
        uv2: Vec2,
        material: u32,
    ) -> Self {
        let normal = face_normal(p0, p1, p2);
        Self {
            v0: Vertex::new(p0, normal, uv0),
            v1: Vertex::new(p1, normal, uv1),
            v2: Vertex::new(p2, normal, uv2),
            normal,
            material,
        }
    }
}

/// Four coplanar vertices, split along the v0-v2 diagonal for
/// intersection. The face normal is shared by both halves.
#[derive(Clone, Copy)]
pub struct Quad {
    pub v0: Vertex,
    pub v1: Vertex,
    pub v2: Vertex,
    pub v3: Vertex,
    pub normal: Vec3,
    pub material: u32,
}

impl Quad {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex, v3: Vertex, material: u32) -> Self {
        let normal = face_normal(v0.position, v1.position, v2.position);
        Self { v0, v1, v2, v3, normal, material }
    }

    pub fn flat(
        p0: Vec3,
        p1: Vec3,
        p2: Vec3,
        p3: Vec3,
        uv0: Vec2,
        uv1: Vec2,
        uv2: Vec2,
        uv3: Vec2,
        material: u32,
    ) -> Self {
        let normal = face_normal(p0, p1, p2);
        Self {
            v0: Vertex::new(p0, normal, uv0),
            v1: Vertex::new(p1, normal, uv1),
            v2: Vertex::new(p2, normal, uv2),
            v3: Vertex::new(p3, normal, uv3),
            normal,
            material,
        }
    }
}

/// The closed set of scene primitives. Keeping this a sum type lets the
/// leaf-intersection loop dispatch with a jump table instead of a vtable.
#[derive(Clone, Copy)]
pub enum Primitive {
    Sphere {
        center: Vec3,
        radius: f32,
        material: u32,
    },
    Triangle(Triangle),
    Quad(Quad),
}

/// Shape-local intersection result; the scene layer adds arena indices.
#[derive(Clone, Copy)]
pub struct SurfaceHit {
    pub t: f32,
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Primitive {
    pub fn material(&self) -> u32 {
        match self {
            Primitive::Sphere { material, .. } => *material,
            Primitive::Triangle(t) => t.material,
            Primitive::Quad(q) => q.material,
        }
    }

    pub fn hit(&self, ray: &Ray, t_max: f32) -> Option<SurfaceHit> {
        match self {
            Primitive::Sphere { center, radius, .. } => {
                hit_sphere(ray, *center, *radius, t_max)
            }
            Primitive::Triangle(tri) => {
                let (t, u, v) = intersect_triangle(
                    ray,
                    tri.v0.position,
                    tri.v1.position,
                    tri.v2.position,
                    t_max,
                )?;
                let w = 1.0 - u - v;
                let normal =
                    (tri.v0.normal * w + tri.v1.normal * u + tri.v2.normal * v).normalize();
                let uv = tri.v0.uv * w + tri.v1.uv * u + tri.v2.uv * v;
                Some(SurfaceHit {
                    t,
                    position: ray.at(t),
                    normal,
                    uv,
                })
            }
            Primitive::Quad(quad) => {
                let first = hit_quad_half(ray, &quad.v0, &quad.v1, &quad.v2, quad.normal, t_max);
                let limit = first.map_or(t_max, |h| h.t);
                let second = hit_quad_half(ray, &quad.v0, &quad.v2, &quad.v3, quad.normal, limit);
                second.or(first)
            }
        }
    }
}

fn face_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Vec3 {
    (p1 - p0).cross(p2 - p0).normalize()
}

fn hit_sphere(ray: &Ray, center: Vec3, radius: f32, t_max: f32) -> Option<SurfaceHit> {
    let po = center - ray.origin;
    let b = po.dot(ray.direction);
    let discriminant = b * b - po.dot(po) + radius * radius;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = b - sqrt_d;
    let t2 = b + sqrt_d;
    let t = if t1 > ray.t_min {
        t1
    } else if t2 > ray.t_min {
        t2
    } else {
        return None;
    };
    if t >= t_max {
        return None;
    }

    let position = ray.at(t);
    let normal = (position - center).normalize();

    // Spherical parametrization: phi around the y axis, theta from pole.
    let theta = normal.y.clamp(-1.0, 1.0).acos();
    let mut phi = normal.x.atan2(normal.z);
    if phi < 0.0 {
        phi += TAU;
    }
    let uv = Vec2::new(phi / TAU, (PI - theta) / PI);

    Some(SurfaceHit { t, position, normal, uv })
}

/// Moller-Trumbore. Returns `(t, u, v)` with barycentrics in range, or
/// `None` for parallel rays and out-of-range hits. Two-sided.
fn intersect_triangle(
    ray: &Ray,
    p0: Vec3,
    p1: Vec3,
    p2: Vec3,
    t_max: f32,
) -> Option<(f32, f32, f32)> {
    let edge1 = p1 - p0;
    let edge2 = p2 - p0;
    let h = ray.direction.cross(edge2);
    let det = edge1.dot(h);
    if det.abs() < EPS_DET {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - p0;
    let u = inv_det * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = inv_det * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv_det * edge2.dot(q);
    if t > ray.t_min && t < t_max {
        Some((t, u, v))
    } else {
        None
    }
}

fn hit_quad_half(
    ray: &Ray,
    v0: &Vertex,
    v1: &Vertex,
    v2: &Vertex,
    normal: Vec3,
    t_max: f32,
) -> Option<SurfaceHit> {
    let (t, u, v) = intersect_triangle(ray, v0.position, v1.position, v2.position, t_max)?;
    let w = 1.0 - u - v;
    let uv = v0.uv * w + v1.uv * u + v2.uv * v;
    Some(SurfaceHit {
        t,
        position: ray.at(t),
        normal,
        uv,
    })
}

impl Bounded for Primitive {
    fn bounds(&self) -> Aabb {
        match self {
            Primitive::Sphere { center, radius, .. } => Aabb::new(
                *center - Vec3::splat(*radius),
                *center + Vec3::splat(*radius),
            ),
            Primitive::Triangle(t) => padded_box(&[t.v0.position, t.v1.position, t.v2.position]),
            Primitive::Quad(q) => {
                padded_box(&[q.v0.position, q.v1.position, q.v2.position, q.v3.position])
            }
        }
    }

    fn center(&self) -> Vec3 {
        match self {
            Primitive::Sphere { center, .. } => *center,
            _ => self.bounds().center(),
        }
    }
}

fn padded_box(points: &[Vec3]) -> Aabb {
    let mut aabb = Aabb::from_point(points[0]);
    for &p in &points[1..] {
        aabb.grow_point(p);
    }
    aabb.min -= Vec3::splat(AABB_PADDING);
    aabb.max += Vec3::splat(AABB_PADDING);
    aabb
}
