//! glTF binary → [`Model`].

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::{Interpolation as GltfInterpolation, Property};
use tracing::{debug, warn};

use crate::error::{Result, ViewerError};
use crate::model::animation::{AnimationClip, Channel, ChannelData, Interpolation, Keyframes};
use crate::model::rig::{
    AlphaMode, Material, Mesh, MeshVertex, Model, Node, Primitive, Skin, SkinWeights, TextureData,
};
use crate::model::transform::Transform;

pub fn parse_model(label: &str, bytes: &[u8]) -> Result<Model> {
    let (document, buffers, images) = gltf::import_slice(bytes)?;
    let buffer_data = |buffer: gltf::Buffer<'_>| buffers.get(buffer.index()).map(|b| &b.0[..]);

    let textures = document.textures().map(|t| convert_image(&images, t.source().index())).collect();
    let materials = document.materials().map(convert_material).collect();

    let meshes = document
        .meshes()
        .map(|mesh| Mesh {
            name: mesh.name().unwrap_or_default().to_string(),
            primitives: mesh.primitives().filter_map(|p| convert_primitive(label, &p, &buffer_data)).collect(),
        })
        .collect();

    let mut nodes: Vec<Node> = document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            Node {
                name: node.name().map(str::to_string).unwrap_or_else(|| format!("node_{}", node.index())),
                parent: None,
                children: node.children().map(|c| c.index()).collect(),
                rest: Transform { translation: Vec3::from_array(t), rotation: Quat::from_array(r), scale: Vec3::from_array(s) },
                mesh: node.mesh().map(|m| m.index()),
                skin: node.skin().map(|s| s.index()),
            }
        })
        .collect();
    for idx in 0..nodes.len() {
        for child in nodes[idx].children.clone() {
            let Some(c) = nodes.get_mut(child) else { continue };
            if let Some(parent) = c.parent {
                return Err(ViewerError::InvalidHierarchy(format!(
                    "node {child} has two parents ({parent} and {idx})"
                )));
            }
            c.parent = Some(idx);
        }
    }

    let roots: Vec<usize> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => (0..nodes.len()).filter(|&i| nodes[i].parent.is_none()).collect(),
    };
    check_acyclic(&nodes, &roots)?;

    let skins = document
        .skins()
        .map(|skin| {
            let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
            let inverse_bind = skin
                .reader(&buffer_data)
                .read_inverse_bind_matrices()
                .map(|m| m.map(|c| Mat4::from_cols_array_2d(&c)).collect())
                .unwrap_or_else(|| vec![Mat4::IDENTITY; joints.len()]);
            Skin { joints, inverse_bind }
        })
        .collect();

    let clips = document.animations().map(|anim| Arc::new(convert_animation(&anim, &buffer_data))).collect();

    let model = Model { label: label.to_string(), nodes, roots, meshes, skins, materials, textures, clips };
    debug!(
        label,
        nodes = model.nodes.len(),
        meshes = model.meshes.len(),
        clips = model.clips.len(),
        "parsed glTF model"
    );
    Ok(model)
}

/// Every node reachable from a root must be reached exactly once.
fn check_acyclic(nodes: &[Node], roots: &[usize]) -> Result<()> {
    let mut seen = vec![false; nodes.len()];
    let mut stack: Vec<usize> = roots.to_vec();
    while let Some(idx) = stack.pop() {
        let Some(node) = nodes.get(idx) else { continue };
        if std::mem::replace(&mut seen[idx], true) {
            return Err(ViewerError::InvalidHierarchy(format!("node {idx} is reachable twice")));
        }
        stack.extend(node.children.iter().copied());
    }
    Ok(())
}

fn convert_material(material: gltf::Material<'_>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    Material {
        base_color: pbr.base_color_factor(),
        base_color_texture: pbr.base_color_texture().map(|info| info.texture().index()),
        double_sided: material.double_sided(),
        alpha_mode: match material.alpha_mode() {
            gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            gltf::material::AlphaMode::Mask => AlphaMode::Mask,
            gltf::material::AlphaMode::Blend => AlphaMode::Blend,
        },
    }
}

fn convert_image(images: &[gltf::image::Data], index: usize) -> TextureData {
    use gltf::image::Format;

    let white = TextureData { width: 1, height: 1, rgba: vec![255; 4] };
    let Some(image) = images.get(index) else {
        return white;
    };
    let rgba = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image.pixels.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255]).collect(),
        Format::R8 => image.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        Format::R8G8 => image.pixels.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], p[1]]).collect(),
        other => {
            warn!(?other, index, "unsupported texture format, using white");
            return white;
        }
    };
    TextureData { width: image.width, height: image.height, rgba }
}

fn convert_primitive<'a, 's, F>(label: &str, primitive: &'a gltf::Primitive<'a>, buffer_data: &F) -> Option<Primitive>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        debug!(label, mode = ?primitive.mode(), "skipping non-triangle primitive");
        return None;
    }
    let reader = primitive.reader(buffer_data.clone());
    let Some(positions) = reader.read_positions() else {
        warn!(label, "primitive without positions skipped");
        return None;
    };
    let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
    let count = positions.len();

    let normals: Vec<Vec3> = reader
        .read_normals()
        .map(|n| n.map(Vec3::from_array).collect())
        .unwrap_or_else(|| vec![Vec3::Y; count]);
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_else(|| vec![[0.0; 2]; count]);
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_else(|| (0..count as u32).collect());

    let skin_weights = match (reader.read_joints(0), reader.read_weights(0)) {
        (Some(joints), Some(weights)) => Some(
            joints
                .into_u16()
                .zip(weights.into_f32())
                .map(|(joints, weights)| SkinWeights { joints, weights })
                .collect::<Vec<_>>(),
        ),
        _ => None,
    };

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, &position)| MeshVertex {
            position,
            normal: normals.get(i).copied().unwrap_or(Vec3::Y),
            uv: uvs.get(i).copied().unwrap_or([0.0; 2]),
        })
        .collect();

    Some(Primitive {
        vertices,
        indices: indices.into_iter().filter(|&i| (i as usize) < count).collect(),
        skin_weights: skin_weights.filter(|w| w.len() == count),
        material: primitive.material().index(),
    })
}

fn convert_animation<'a, 's, F>(anim: &gltf::Animation<'a>, buffer_data: &F) -> AnimationClip
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let mut channels = Vec::new();
    for channel in anim.channels() {
        let reader = channel.reader(buffer_data.clone());
        let node = channel.target().node().index();
        let Some(times) = reader.read_inputs().map(|t| t.collect::<Vec<f32>>()) else {
            continue;
        };
        let interpolation = match channel.sampler().interpolation() {
            GltfInterpolation::Step => Interpolation::Step,
            GltfInterpolation::Linear => Interpolation::Linear,
            GltfInterpolation::CubicSpline => Interpolation::CubicSpline,
        };

        let data = match (channel.target().property(), reader.read_outputs()) {
            (Property::Translation, Some(ReadOutputs::Translations(v))) => {
                ChannelData::Translation(Keyframes::new(times, v.map(Vec3::from_array).collect(), interpolation))
            }
            (Property::Rotation, Some(ReadOutputs::Rotations(v))) => {
                ChannelData::Rotation(Keyframes::new(times, v.into_f32().map(Quat::from_array).collect(), interpolation))
            }
            (Property::Scale, Some(ReadOutputs::Scales(v))) => {
                ChannelData::Scale(Keyframes::new(times, v.map(Vec3::from_array).collect(), interpolation))
            }
            (property, _) => {
                debug!(?property, node, "skipping unsupported animation channel");
                continue;
            }
        };
        channels.push(Channel { node, data });
    }
    AnimationClip::new(anim.name().map(str::to_string).unwrap_or_else(|| format!("clip_{}", anim.index())), channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a .glb with one triangle on a child node and one clip that
    /// moves the child, so parsing can be checked without fixture files.
    fn triangle_glb() -> Vec<u8> {
        glb_with_nodes(r#"[{ "name": "root", "children": [1] }, { "name": "tri", "mesh": 0, "translation": [0, 1, 0] }]"#)
    }

    fn glb_with_nodes(nodes: &str) -> Vec<u8> {
        let mut bin: Vec<u8> = Vec::new();
        for p in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in p {
                bin.extend(c.to_le_bytes());
            }
        }
        for i in [0u16, 1, 2, 0] {
            bin.extend(i.to_le_bytes());
        }
        for t in [0.0f32, 1.0] {
            bin.extend(t.to_le_bytes());
        }
        for v in [[0.0f32, 0.0, 0.0], [0.0, 2.0, 0.0]] {
            for c in v {
                bin.extend(c.to_le_bytes());
            }
        }
        assert_eq!(bin.len(), 36 + 8 + 8 + 24);

        let json = format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": {nodes},
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }}] }}],
  "animations": [{{
    "name": "rise",
    "channels": [{{ "sampler": 0, "target": {{ "node": 1, "path": "translation" }} }}],
    "samplers": [{{ "input": 2, "output": 3, "interpolation": "LINEAR" }}]
  }}],
  "buffers": [{{ "byteLength": {len} }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }},
    {{ "buffer": 0, "byteOffset": 44, "byteLength": 8 }},
    {{ "buffer": 0, "byteOffset": 52, "byteLength": 24 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }},
    {{ "bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0], "max": [1] }},
    {{ "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3" }}
  ]
}}"#,
            len = bin.len(),
            nodes = nodes,
        );

        let mut json = json.into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let total = 12 + 8 + json.len() + 8 + bin.len();

        let mut glb = Vec::new();
        glb.extend(b"glTF");
        glb.extend(2u32.to_le_bytes());
        glb.extend((total as u32).to_le_bytes());
        glb.extend((json.len() as u32).to_le_bytes());
        glb.extend(b"JSON");
        glb.extend(json);
        glb.extend((bin.len() as u32).to_le_bytes());
        glb.extend(b"BIN\0");
        glb.extend(bin);
        glb
    }

    #[test]
    fn parses_hierarchy_mesh_and_clip() {
        let model = parse_model("triangle", &triangle_glb()).unwrap();

        assert_eq!(model.roots, vec![0]);
        assert_eq!(model.nodes[1].parent, Some(0));
        assert_eq!(model.nodes[1].rest.translation, Vec3::Y);

        let prim = &model.meshes[0].primitives[0];
        assert_eq!(prim.vertices.len(), 3);
        assert_eq!(prim.indices, vec![0, 1, 2]);
        assert!(prim.skin_weights.is_none());
        assert_eq!(prim.vertices[0].normal, Vec3::Y);

        assert_eq!(model.clips.len(), 1);
        let clip = &model.clips[0];
        assert_eq!(clip.name, "rise");
        assert_eq!(clip.duration, 1.0);
        assert_eq!(clip.channels[0].node, 1);
        match &clip.channels[0].data {
            ChannelData::Translation(k) => assert_eq!(k.sample(0.5), Some(Vec3::new(0.0, 1.0, 0.0))),
            other => panic!("unexpected channel {other:?}"),
        }
    }

    #[test]
    fn truncated_file_is_a_gltf_error() {
        let glb = triangle_glb();
        let err = parse_model("broken", &glb[..40]).unwrap_err();
        assert!(matches!(err, ViewerError::Gltf(_)));
    }

    #[test]
    fn cyclic_hierarchy_is_rejected() {
        let glb = glb_with_nodes(r#"[{ "name": "root", "children": [1] }, { "name": "tri", "mesh": 0, "children": [0] }]"#);
        let err = parse_model("cyclic", &glb).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidHierarchy(_)), "{err}");
    }

    #[test]
    fn shared_child_is_rejected() {
        let glb = glb_with_nodes(
            r#"[{ "name": "a", "children": [2] }, { "name": "b", "children": [2] }, { "name": "tri", "mesh": 0 }]"#,
        );
        let err = parse_model("shared", &glb).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidHierarchy(_) | ViewerError::Gltf(_)), "{err}");
    }
}
