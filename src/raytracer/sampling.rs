use glam::Vec3;
use std::f32::consts::TAU;

/// Right-handed orthonormal basis `(u, v)` completing the unit vector
/// `w`. The up reference is x unless `w` leans too far along x.
pub fn orthonormal_basis(w: Vec3) -> (Vec3, Vec3) {
    let up = if w.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let u = up.cross(w).normalize();
    let v = w.cross(u);
    (u, v)
}

#[inline]
pub fn to_world(local: Vec3, u: Vec3, v: Vec3, w: Vec3) -> Vec3 {
    u * local.x + v * local.y + w * local.z
}

/// Cosine-weighted hemisphere direction in local z-up coordinates.
pub fn sample_cosine_hemisphere(xi1: f32, xi2: f32) -> Vec3 {
    let phi = TAU * xi1;
    let r = xi2.sqrt();
    Vec3::new(
        r * phi.cos(),
        r * phi.sin(),
        (1.0 - xi2).max(0.0).sqrt(),
    )
}

#[inline]
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * incident.dot(normal) * normal
}

/// Flips `normal` onto the side the ray arrives from. `incoming` points
/// from the eye toward the surface.
#[inline]
pub fn face_forward(normal: Vec3, incoming: Vec3) -> Vec3 {
    if normal.dot(incoming) < 0.0 {
        normal
    } else {
        -normal
    }
}
