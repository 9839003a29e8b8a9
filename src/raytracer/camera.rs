use crate::raytracer::ray::Ray;
use glam::Vec3;

/// Pinhole camera. `update` derives the screen-spanning vectors from the
/// look-at parameters; `primary_ray` maps normalized image coordinates
/// in [0, 1] (x right, y up) onto the screen plane.
#[derive(Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub width: u32,
    pub height: u32,
    /// Vertical field-of-view scale applied to the screen vectors.
    pub fov: f32,
    pub near: f32,
    screen_x: Vec3,
    screen_y: Vec3,
    screen_center: Vec3,
}

impl Camera {
    pub fn new(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        width: u32,
        height: u32,
        fov: f32,
        near: f32,
    ) -> Self {
        let mut camera = Camera {
            position,
            target,
            up,
            width,
            height,
            fov,
            near,
            screen_x: Vec3::ZERO,
            screen_y: Vec3::ZERO,
            screen_center: Vec3::ZERO,
        };
        camera.update();
        camera
    }

    pub fn update(&mut self) {
        let direction = (self.target - self.position).normalize();
        let aspect = self.width as f32 / self.height as f32;
        self.screen_x = direction.cross(self.up).normalize() * self.fov * aspect;
        self.screen_y = self.screen_x.cross(direction).normalize() * self.fov;
        self.screen_center = self.position + direction * self.near;
    }

    pub fn primary_ray(&self, x: f32, y: f32) -> Ray {
        let point = self.screen_x * (x - 0.5) + self.screen_y * (y - 0.5) + self.screen_center;
        Ray::new(self.position, (point - self.position).normalize())
    }
}
