use glam::Vec3;

use crate::model::rig::ModelInstance;

/// Equirectangular HDR image as RGBA16F texels.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<half::f16>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    /// Direction the light travels *from*, unit length.
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
    pub sun_intensity: f32,
    pub sky_color: Vec3,
    pub ground_color: Vec3,
    pub hemisphere_intensity: f32,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: 0.5,
            sun_direction: Vec3::ONE.normalize(),
            sun_color: Vec3::ONE,
            sun_intensity: 1.0,
            sky_color: rgb(0xffffbb),
            ground_color: rgb(0x080820),
            hemisphere_intensity: 1.0,
        }
    }
}

fn rgb(hex: u32) -> Vec3 {
    Vec3::new(((hex >> 16) & 0xff) as f32, ((hex >> 8) & 0xff) as f32, (hex & 0xff) as f32) / 255.0
}

/// Everything that gets drawn. Each slot stays `None` until its asset has
/// loaded and is never cleared afterwards.
#[derive(Debug, Default)]
pub struct SceneGraph {
    pub environment: Option<EnvironmentMap>,
    pub lights: LightRig,
    pub character: Option<ModelInstance>,
    pub ground: Option<ModelInstance>,
    /// The tracked object that follows the pointer.
    pub hand: Option<ModelInstance>,
    revision: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped whenever an asset is inserted; the renderer uses it to notice
    /// new GPU uploads are needed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_environment(&mut self, env: EnvironmentMap) {
        self.environment = Some(env);
        self.revision += 1;
    }

    pub fn set_character(&mut self, instance: ModelInstance) {
        self.character = Some(instance);
        self.revision += 1;
    }

    pub fn set_ground(&mut self, instance: ModelInstance) {
        self.ground = Some(instance);
        self.revision += 1;
    }

    pub fn set_hand(&mut self, instance: ModelInstance) {
        self.hand = Some(instance);
        self.revision += 1;
    }

    pub fn instances(&self) -> impl Iterator<Item = (ModelSlot, &ModelInstance)> {
        [
            (ModelSlot::Character, self.character.as_ref()),
            (ModelSlot::Ground, self.ground.as_ref()),
            (ModelSlot::Hand, self.hand.as_ref()),
        ]
        .into_iter()
        .filter_map(|(slot, inst)| inst.map(|i| (slot, i)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSlot {
    Character,
    Ground,
    Hand,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rig::tests::two_node_model;
    use crate::model::transform::Transform;
    use std::sync::Arc;

    #[test]
    fn hex_colours_decode() {
        assert_eq!(rgb(0xffffff), Vec3::ONE);
        assert_eq!(rgb(0x000000), Vec3::ZERO);
    }

    #[test]
    fn inserting_bumps_revision_and_lists_instance() {
        let mut scene = SceneGraph::new();
        assert_eq!(scene.instances().count(), 0);
        scene.set_hand(ModelInstance::new(Arc::new(two_node_model()), Transform::IDENTITY));
        assert_eq!(scene.revision(), 1);
        let slots: Vec<_> = scene.instances().map(|(s, _)| s).collect();
        assert_eq!(slots, vec![ModelSlot::Hand]);
    }
}
