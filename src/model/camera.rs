use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::config::CameraConfig;
use crate::model::ray::Ray;

/// Size of the drawing surface in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width: width.max(1) as f32, height: height.max(1) as f32 }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Pixel coordinates (origin top-left, y down) to normalized device
    /// coordinates (origin centre, y up).
    pub fn to_ndc(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            (screen.x / self.width) * 2.0 - 1.0,
            -(screen.y / self.height) * 2.0 + 1.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, viewport: Viewport) -> Self {
        Self {
            eye: Vec3::from_array(config.position),
            target: Vec3::from_array(config.target),
            up: Vec3::Y,
            fov_y: config.fov_y_degrees.to_radians(),
            aspect: viewport.aspect(),
            z_near: config.z_near,
            z_far: config.z_far,
        }
    }

    pub fn set_aspect(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Maps a point in NDC (z in clip depth range) back to world space.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        let world = self.view_proj().inverse() * Vec4::new(ndc.x, ndc.y, ndc.z, 1.0);
        world.truncate() / world.w
    }

    /// Ray from the eye through a point given in NDC.
    pub fn ray_through(&self, ndc: Vec2) -> Ray {
        let on_ray = self.unproject(Vec3::new(ndc.x, ndc.y, 0.5));
        Ray::new(self.eye, on_ray - self.eye)
    }
}
