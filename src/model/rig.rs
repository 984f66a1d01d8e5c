//! Parsed models and their placed, posed instances.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::model::animation::AnimationClip;
use crate::model::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: [f32; 2],
}

/// Joint influences for one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkinWeights {
    pub joints: [u16; 4],
    pub weights: [f32; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    /// Present only on skinned primitives, one entry per vertex.
    pub skin_weights: Option<Vec<SkinWeights>>,
    pub material: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaMode {
    Opaque,
    Mask,
    Blend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub base_color: [f32; 4],
    pub base_color_texture: Option<usize>,
    pub double_sided: bool,
    pub alpha_mode: AlphaMode,
}

impl Default for Material {
    fn default() -> Self {
        Self { base_color: [1.0; 4], base_color_texture: None, double_sided: false, alpha_mode: AlphaMode::Opaque }
    }
}

/// RGBA8 pixels, sRGB encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<Mat4>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub rest: Transform,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
}

/// Immutable contents of one model file.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub label: String,
    pub nodes: Vec<Node>,
    pub roots: Vec<usize>,
    pub meshes: Vec<Mesh>,
    pub skins: Vec<Skin>,
    pub materials: Vec<Material>,
    pub textures: Vec<TextureData>,
    pub clips: Vec<Arc<AnimationClip>>,
}

impl Model {
    /// Node indices with every parent ahead of its children. Each node is
    /// visited at most once, even if the hierarchy loops.
    pub fn traversal_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            let Some(node) = self.nodes.get(idx) else { continue };
            if std::mem::replace(&mut seen[idx], true) {
                continue;
            }
            order.push(idx);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    pub fn rest_pose(&self) -> Vec<Transform> {
        self.nodes.iter().map(|n| n.rest).collect()
    }
}

/// A model placed in the scene, with its current pose.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub model: Arc<Model>,
    pub placement: Transform,
    pose: Vec<Transform>,
    world: Vec<Mat4>,
    order: Vec<usize>,
}

impl ModelInstance {
    pub fn new(model: Arc<Model>, placement: Transform) -> Self {
        let pose = model.rest_pose();
        let order = model.traversal_order();
        let mut instance = Self { world: vec![Mat4::IDENTITY; pose.len()], model, placement, pose, order };
        instance.update_world();
        instance
    }

    pub fn pose(&self) -> &[Transform] {
        &self.pose
    }

    pub fn set_pose(&mut self, pose: Vec<Transform>) {
        if pose.len() == self.pose.len() {
            self.pose = pose;
        }
        self.update_world();
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.placement.translation = position;
        self.update_world();
    }

    pub fn position(&self) -> Vec3 {
        self.placement.translation
    }

    pub fn world_matrices(&self) -> &[Mat4] {
        &self.world
    }

    pub fn update_world(&mut self) {
        let root = self.placement.matrix();
        for &idx in &self.order {
            let local = self.pose[idx].matrix();
            let parent = self.model.nodes[idx].parent.map_or(root, |p| self.world[p]);
            self.world[idx] = parent * local;
        }
    }

    /// Joint matrices for `skin` under the current pose.
    pub fn joint_matrices(&self, skin: usize) -> Vec<Mat4> {
        let Some(skin) = self.model.skins.get(skin) else {
            return Vec::new();
        };
        skin.joints
            .iter()
            .enumerate()
            .map(|(i, &joint)| {
                let ibm = skin.inverse_bind.get(i).copied().unwrap_or(Mat4::IDENTITY);
                self.world.get(joint).copied().unwrap_or(Mat4::IDENTITY) * ibm
            })
            .collect()
    }
}

/// Linear blend skinning on the CPU. Output is in world space.
pub fn skin_vertices(primitive: &Primitive, joints: &[Mat4]) -> Vec<MeshVertex> {
    let Some(weights) = &primitive.skin_weights else {
        return primitive.vertices.clone();
    };
    primitive
        .vertices
        .iter()
        .zip(weights)
        .map(|(v, sw)| {
            let mut m = Mat4::ZERO;
            let mut total = 0.0;
            for (&j, &w) in sw.joints.iter().zip(&sw.weights) {
                if w > 0.0 {
                    if let Some(jm) = joints.get(j as usize) {
                        m += *jm * w;
                        total += w;
                    }
                }
            }
            if total <= f32::EPSILON {
                return *v;
            }
            let m = m * (1.0 / total);
            MeshVertex {
                position: m.transform_point3(v.position),
                normal: m.transform_vector3(v.normal).normalize_or_zero(),
                uv: v.uv,
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use glam::Quat;

    /// root -> child, child offset one unit up.
    pub(crate) fn two_node_model() -> Model {
        Model {
            label: "test".into(),
            nodes: vec![
                Node { name: "root".into(), children: vec![1], ..Default::default() },
                Node {
                    name: "child".into(),
                    parent: Some(0),
                    rest: Transform { translation: Vec3::Y, ..Transform::IDENTITY },
                    ..Default::default()
                },
            ],
            roots: vec![0],
            ..Default::default()
        }
    }

    #[test]
    fn parents_come_before_children() {
        let mut model = two_node_model();
        model.nodes.push(Node { name: "grandchild".into(), parent: Some(1), ..Default::default() });
        model.nodes[1].children.push(2);
        assert_eq!(model.traversal_order(), vec![0, 1, 2]);
    }

    #[test]
    fn looping_hierarchy_still_terminates() {
        let mut model = two_node_model();
        model.nodes[1].children.push(0);
        assert_eq!(model.traversal_order(), vec![0, 1]);
        let inst = ModelInstance::new(Arc::new(model), Transform::IDENTITY);
        assert_eq!(inst.world_matrices().len(), 2);
    }

    #[test]
    fn placement_scales_and_rotates_hierarchy() {
        let placement = Transform { scale: Vec3::splat(10.0), rotation: Quat::from_rotation_y(1.0), ..Transform::IDENTITY };
        let inst = ModelInstance::new(Arc::new(two_node_model()), placement);
        let child = inst.world_matrices()[1].transform_point3(Vec3::ZERO);
        assert!((child - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn moving_instance_moves_every_node() {
        let mut inst = ModelInstance::new(Arc::new(two_node_model()), Transform::IDENTITY);
        inst.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(inst.position(), Vec3::new(1.0, 2.0, 3.0));
        let child = inst.world_matrices()[1].transform_point3(Vec3::ZERO);
        assert!((child - Vec3::new(1.0, 3.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn skinning_follows_joint() {
        let mut model = two_node_model();
        model.skins.push(Skin {
            joints: vec![1],
            inverse_bind: vec![Mat4::from_translation(-Vec3::Y)],
        });
        let mut inst = ModelInstance::new(Arc::new(model), Transform::IDENTITY);
        let mut pose = inst.pose().to_vec();
        pose[1].translation = Vec3::new(2.0, 1.0, 0.0);
        inst.set_pose(pose);

        let prim = Primitive {
            vertices: vec![MeshVertex { position: Vec3::Y, normal: Vec3::Z, uv: [0.0; 2] }],
            indices: vec![0],
            skin_weights: Some(vec![SkinWeights { joints: [0; 4], weights: [1.0, 0.0, 0.0, 0.0] }]),
            material: None,
        };
        let skinned = skin_vertices(&prim, &inst.joint_matrices(0));
        assert!((skinned[0].position - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-5);
        assert!((skinned[0].normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn wrong_sized_pose_is_ignored() {
        let mut inst = ModelInstance::new(Arc::new(two_node_model()), Transform::IDENTITY);
        inst.set_pose(vec![Transform::IDENTITY; 5]);
        assert_eq!(inst.pose().len(), 2);
    }
}
