use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::config::OrbitConfig;
use crate::model::{Camera, Viewport};

const EPS: f32 = 1e-6;

/// Rotate-and-zoom camera rig around a fixed target.
///
/// Pointer drags and wheel steps only accumulate deltas; [`OrbitControls::update`]
/// applies them once per frame, easing them out when damping is on.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub config: OrbitConfig,
    pub target: Vec3,
    radius: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    rotate_delta: Vec2,
    zoom_scale: f32,
    drag_anchor: Option<Vec2>,
}

impl OrbitControls {
    /// Starts from wherever `camera` currently is.
    pub fn new(config: OrbitConfig, camera: &Camera) -> Self {
        let offset = camera.eye - camera.target;
        let radius = offset.length();
        let (theta, phi) = if radius > EPS {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI / 2.0)
        };
        Self {
            config,
            target: camera.target,
            radius,
            theta,
            phi,
            rotate_delta: Vec2::ZERO,
            zoom_scale: 1.0,
            drag_anchor: None,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn polar_angle(&self) -> f32 {
        self.phi
    }

    pub fn azimuth(&self) -> f32 {
        self.theta
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn begin_drag(&mut self, at: Vec2) {
        if self.config.enable_rotate {
            self.drag_anchor = Some(at);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    /// Pointer moved while possibly dragging. A full viewport height of
    /// travel turns the camera once around.
    pub fn drag_to(&mut self, at: Vec2, viewport: Viewport) {
        let Some(anchor) = self.drag_anchor else {
            return;
        };
        let delta = at - anchor;
        let per_pixel = 2.0 * PI / viewport.height * self.config.rotate_speed;
        self.rotate_delta.x -= delta.x * per_pixel;
        self.rotate_delta.y -= delta.y * per_pixel;
        self.drag_anchor = Some(at);
    }

    /// Negative `delta_y` (wheel away from the user) zooms in.
    pub fn wheel(&mut self, delta_y: f32) {
        if !self.config.enable_zoom || delta_y == 0.0 {
            return;
        }
        let step = 0.95_f32.powf(self.config.zoom_speed);
        if delta_y < 0.0 {
            self.zoom_scale *= step;
        } else {
            self.zoom_scale /= step;
        }
    }

    /// Applies pending input and moves the camera. Returns whether the
    /// camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let before = camera.eye;

        if self.config.enable_damping {
            let k = self.config.damping_factor;
            self.theta += self.rotate_delta.x * k;
            self.phi += self.rotate_delta.y * k;
            self.rotate_delta *= 1.0 - k;
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }

        let min_phi = self.config.min_polar_angle.max(EPS);
        let max_phi = self.config.max_polar_angle.min(PI - EPS).max(min_phi);
        self.phi = self.phi.clamp(min_phi, max_phi);

        self.radius = (self.radius * self.zoom_scale).clamp(self.config.min_distance, self.config.max_distance);
        self.zoom_scale = 1.0;

        let sin_phi = self.phi.sin();
        let offset = Vec3::new(sin_phi * self.theta.sin(), self.phi.cos(), sin_phi * self.theta.cos()) * self.radius;
        camera.target = self.target;
        camera.eye = self.target + offset;

        camera.eye.distance(before) > 1e-4
    }
}
