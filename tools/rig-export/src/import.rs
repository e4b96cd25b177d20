//! glTF/GLB import into a [`Scene`].
//!
//! - The scene's top-level nodes hang under a synthetic identity root
//! - Each triangle list, strip or fan primitive becomes one [`SceneMesh`],
//!   with strips and fans unrolled into triangle lists
//! - Skin joints become mesh bones, with the skin's inverse bind matrices
//!   as offsets and JOINTS_0/WEIGHTS_0 turned into per-bone weight lists
//! - Animation channels are grouped by target node; glTF keys are already
//!   in seconds, so clips use one tick per second

use std::path::Path;

use anyhow::{Context, Result};
use glam::{Mat4, Quat, Vec3};
use gltf::animation::Interpolation;
use gltf::animation::util::ReadOutputs;
use gltf::mesh::Mode;
use hashbrown::HashMap;

use crate::scene::{
    NodeChannel, Scene, SceneAnimation, SceneBone, SceneMesh, SceneNode, SceneQuatKey,
    SceneVectorKey, VertexWeight,
};

/// Name of the synthetic node above the glTF scene's top-level nodes
pub const ROOT_NODE_NAME: &str = "RootNode";

/// Import a `.gltf` or `.glb` file
pub fn import_gltf(input: &Path) -> Result<Scene> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;
    let scene = build_scene(&document, &buffers)?;

    tracing::info!(
        "Imported {:?}: {} nodes, {} meshes, {} animations",
        input,
        scene.root.node_count(),
        scene.meshes.len(),
        scene.animations.len()
    );
    Ok(scene)
}

/// Import from an in-memory glTF/GLB with embedded buffers
pub fn import_gltf_slice(bytes: &[u8]) -> Result<Scene> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).context("Failed to parse glTF data")?;
    build_scene(&document, &buffers)
}

fn build_scene(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<Scene> {
    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("No scenes found in glTF")?;

    let mut root = SceneNode::new(ROOT_NODE_NAME, Mat4::IDENTITY);
    let mut meshes = Vec::new();
    for node in gltf_scene.nodes() {
        root.children.push(import_node(&node, buffers, &mut meshes)?);
    }

    let animations = document
        .animations()
        .map(|animation| import_animation(&animation, buffers))
        .collect::<Result<Vec<_>>>()?;

    Ok(Scene {
        root,
        meshes,
        animations,
    })
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

fn import_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    meshes: &mut Vec<SceneMesh>,
) -> Result<SceneNode> {
    if let Some(mesh) = node.mesh() {
        import_mesh(&mesh, node.skin().as_ref(), buffers, meshes)?;
    }

    let mut scene_node = SceneNode::new(
        node_name(node),
        Mat4::from_cols_array_2d(&node.transform().matrix()),
    );
    for child in node.children() {
        scene_node
            .children
            .push(import_node(&child, buffers, meshes)?);
    }
    Ok(scene_node)
}

fn import_mesh(
    mesh: &gltf::Mesh,
    skin: Option<&gltf::Skin>,
    buffers: &[gltf::buffer::Data],
    meshes: &mut Vec<SceneMesh>,
) -> Result<()> {
    let base_name = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
    let primitive_count = mesh.primitives().len();

    for primitive in mesh.primitives() {
        let name = if primitive_count == 1 {
            base_name.clone()
        } else {
            format!("{}_{}", base_name, primitive.index())
        };
        let mode = primitive.mode();
        if !matches!(
            mode,
            Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan
        ) {
            tracing::warn!(
                "Skipping primitive '{}': mode {:?} has no triangles",
                name,
                mode
            );
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .with_context(|| format!("No positions in mesh '{}'", name))?
            .collect();
        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
        let uvs: Option<Vec<[f32; 2]>> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect());
        let colors: Option<Vec<[f32; 4]>> = reader
            .read_colors(0)
            .map(|iter| iter.into_rgba_f32().collect());

        // Non-indexed primitives draw their vertices in order
        let indices: Vec<u32> = reader
            .read_indices()
            .map(|iter| iter.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());
        let faces = triangle_faces(mode, &indices);

        let bones = match skin {
            Some(skin) => {
                let joints: Option<Vec<[u16; 4]>> =
                    reader.read_joints(0).map(|iter| iter.into_u16().collect());
                let weights: Option<Vec<[f32; 4]>> =
                    reader.read_weights(0).map(|iter| iter.into_f32().collect());
                skin_bones(skin, buffers, joints.as_deref(), weights.as_deref())?
            }
            None => Vec::new(),
        };

        meshes.push(SceneMesh {
            name,
            positions,
            normals,
            uvs,
            colors,
            faces,
            bones,
        });
    }
    Ok(())
}

/// Triangle list for a primitive's index stream.
///
/// Strips alternate winding on odd triangles and fans pivot on the first
/// index, matching the glTF primitive topology rules.
fn triangle_faces(mode: Mode, indices: &[u32]) -> Vec<Vec<u32>> {
    match mode {
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    vec![w[0], w[1], w[2]]
                } else {
                    vec![w[0], w[2], w[1]]
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&pivot, rest)) => rest
                .windows(2)
                .map(|w| vec![w[0], w[1], pivot])
                .collect(),
            None => Vec::new(),
        },
        _ => indices.chunks(3).map(<[u32]>::to_vec).collect(),
    }
}

/// One bone per skin joint, in joint order
fn skin_bones(
    skin: &gltf::Skin,
    buffers: &[gltf::buffer::Data],
    joints: Option<&[[u16; 4]]>,
    weights: Option<&[[f32; 4]]>,
) -> Result<Vec<SceneBone>> {
    let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
    let inverse_bind_matrices: Vec<Mat4> = reader
        .read_inverse_bind_matrices()
        .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
        .unwrap_or_default();

    let mut bones: Vec<SceneBone> = skin
        .joints()
        .enumerate()
        .map(|(i, joint)| SceneBone {
            name: node_name(&joint),
            // Missing inverse bind matrices mean identity
            offset: inverse_bind_matrices
                .get(i)
                .copied()
                .unwrap_or(Mat4::IDENTITY),
            weights: Vec::new(),
        })
        .collect();

    match (joints, weights) {
        (Some(joints), Some(weights)) => {
            for (vertex, (joint, weight)) in joints.iter().zip(weights).enumerate() {
                for (&slot, &w) in joint.iter().zip(weight) {
                    if w <= 0.0 {
                        continue;
                    }
                    let bone = bones.get_mut(slot as usize).with_context(|| {
                        format!(
                            "Vertex {} references joint {} but skin '{}' has {} joints",
                            vertex,
                            slot,
                            skin.name().unwrap_or("unnamed"),
                            skin.joints().len()
                        )
                    })?;
                    bone.weights.push(VertexWeight {
                        vertex: vertex as u32,
                        weight: w,
                    });
                }
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            tracing::warn!(
                "Mesh has partial skinning data (joints or weights missing), ignoring weights"
            );
        }
        (None, None) => {}
    }

    Ok(bones)
}

fn import_animation(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
) -> Result<SceneAnimation> {
    let name = animation
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("animation_{}", animation.index()));

    let mut channels: Vec<NodeChannel> = Vec::new();
    let mut channel_for_node: HashMap<usize, usize> = HashMap::new();
    let mut duration = 0.0f64;

    for channel in animation.channels() {
        let target = channel.target().node();
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let times: Vec<f64> = reader
            .read_inputs()
            .with_context(|| format!("Animation '{}' channel has no key times", name))?
            .map(f64::from)
            .collect();
        if let Some(&last) = times.last() {
            duration = duration.max(last);
        }

        let cubic = channel.sampler().interpolation() == Interpolation::CubicSpline;
        let index = *channel_for_node.entry(target.index()).or_insert_with(|| {
            channels.push(NodeChannel {
                node_name: node_name(&target),
                ..NodeChannel::default()
            });
            channels.len() - 1
        });
        let node_channel = &mut channels[index];

        match reader.read_outputs() {
            Some(ReadOutputs::Translations(values)) => {
                node_channel.position_keys = vector_keys(&times, key_values(values, cubic));
            }
            Some(ReadOutputs::Scales(values)) => {
                node_channel.scaling_keys = vector_keys(&times, key_values(values, cubic));
            }
            Some(ReadOutputs::Rotations(values)) => {
                node_channel.rotation_keys = times
                    .iter()
                    .zip(key_values(values.into_f32(), cubic))
                    .map(|(&time, xyzw)| SceneQuatKey {
                        time,
                        value: Quat::from_array(xyzw).normalize(),
                    })
                    .collect();
            }
            Some(ReadOutputs::MorphTargetWeights(_)) => {
                tracing::debug!("Animation '{}': ignoring morph target weights", name);
            }
            None => {
                tracing::warn!("Animation '{}': channel has no output values", name);
            }
        }
    }

    Ok(SceneAnimation {
        name,
        duration,
        ticks_per_second: 1.0,
        channels,
    })
}

/// Key values, keeping only the value of each cubic spline
/// (in-tangent, value, out-tangent) triplet
fn key_values<T>(values: impl Iterator<Item = T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.skip(1).step_by(3).collect()
    } else {
        values.collect()
    }
}

fn vector_keys(times: &[f64], values: Vec<[f32; 3]>) -> Vec<SceneVectorKey> {
    times
        .iter()
        .zip(values)
        .map(|(&time, value)| SceneVectorKey {
            time,
            value: Vec3::from_array(value),
        })
        .collect()
}
