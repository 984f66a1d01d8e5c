use glam::{Mat4, Quat, Vec3};

use crate::config::Placement;

/// Translation, rotation and scale, applied scale-first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl From<Placement> for Transform {
    fn from(p: Placement) -> Self {
        Self {
            translation: Vec3::from_array(p.translation),
            rotation: Quat::from_rotation_y(p.rotation_y),
            scale: Vec3::splat(p.scale),
        }
    }
}
