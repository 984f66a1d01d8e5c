use glam::{Vec2, Vec3};

use crate::model::{Camera, ModelInstance, Viewport};

/// Point `distance` units from the camera along the ray under `screen`.
pub fn world_point(screen: Vec2, viewport: Viewport, camera: &Camera, distance: f32) -> Vec3 {
    camera.ray_through(viewport.to_ndc(screen)).at(distance)
}

/// Keeps the hand model glued to the pointer at a fixed depth.
#[derive(Debug, Clone, Copy)]
pub struct PointerTrackingController {
    pub distance: f32,
}

impl PointerTrackingController {
    pub fn new(distance: f32) -> Self {
        Self { distance }
    }

    /// Moves `tracked` under the pointer. Without a tracked object this does
    /// nothing and returns `None`.
    pub fn on_move(
        &self,
        screen: Vec2,
        viewport: Viewport,
        camera: &Camera,
        tracked: Option<&mut ModelInstance>,
    ) -> Option<Vec3> {
        let tracked = tracked?;
        let point = world_point(screen, viewport, camera, self.distance);
        tracked.set_position(point);
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::model::rig::tests::two_node_model;
    use crate::model::Transform;
    use std::sync::Arc;

    fn camera() -> (Camera, Viewport) {
        let vp = Viewport::new(800, 600);
        (Camera::new(&CameraConfig::default(), vp), vp)
    }

    #[test]
    fn centre_of_screen_lands_on_view_axis() {
        let (cam, vp) = camera();
        let p = world_point(Vec2::new(400.0, 300.0), vp, &cam, 17.0);
        let expected = cam.eye + cam.forward() * 17.0;
        assert!((p - expected).length() < 1e-3);
        assert!((p.distance(cam.eye) - 17.0).abs() < 1e-3);
    }

    #[test]
    fn same_input_same_position() {
        let (cam, vp) = camera();
        let ctl = PointerTrackingController::new(17.0);
        let mut hand = ModelInstance::new(Arc::new(two_node_model()), Transform::IDENTITY);
        let a = ctl.on_move(Vec2::new(120.0, 450.0), vp, &cam, Some(&mut hand));
        let b = ctl.on_move(Vec2::new(120.0, 450.0), vp, &cam, Some(&mut hand));
        assert_eq!(a, b);
        assert_eq!(a, Some(hand.position()));
    }

    #[test]
    fn nothing_to_track_is_a_no_op() {
        let (cam, vp) = camera();
        let ctl = PointerTrackingController::new(17.0);
        assert_eq!(ctl.on_move(Vec2::new(10.0, 10.0), vp, &cam, None), None);
    }
}
