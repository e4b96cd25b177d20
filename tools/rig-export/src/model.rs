//! Model compiler (scene meshes -> models.pack)

use std::collections::BTreeMap;

use rig_common::{BoneId, BoneRecord, Mesh, Model, Vertex};

use crate::error::CompileError;
use crate::registry::BoneRegistry;
use crate::scene::{Scene, SceneMesh, SceneNode};
use crate::skeleton::find_root_bone;

/// Compile every mesh of `scene` into a [`Model`].
///
/// Bones referenced by the meshes are registered in `bones` as they are met,
/// so ids stay stable across every model compiled with the same registry.
/// Bone records are emitted in ascending id order.
pub fn compile_model(scene: &Scene, bones: &mut BoneRegistry) -> Result<Model, CompileError> {
    let mut records: BTreeMap<BoneId, BoneRecord> = BTreeMap::new();
    let mut meshes = Vec::with_capacity(scene.meshes.len());

    for scene_mesh in &scene.meshes {
        meshes.push(compile_mesh(scene_mesh, &scene.root, bones, &mut records)?);
    }

    let root_bone = find_root_bone(&scene.root, bones).ok_or(CompileError::NoRootBone)?;
    let root_bone_id = bones.lookup(&root_bone.name)?;

    Ok(Model {
        meshes,
        root_transform: scene.root.transform,
        root_bone_id,
        bones: records.into_values().collect(),
    })
}

fn compile_mesh(
    mesh: &SceneMesh,
    root: &SceneNode,
    bones: &mut BoneRegistry,
    records: &mut BTreeMap<BoneId, BoneRecord>,
) -> Result<Mesh, CompileError> {
    let mut vertices: Vec<Vertex> = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: attribute(&mesh.normals, i).unwrap_or_default(),
            uv: attribute(&mesh.uvs, i).unwrap_or_default(),
            // Opaque white when the mesh carries no colors
            color: attribute(&mesh.colors, i).unwrap_or([1.0; 4]),
            ..Vertex::default()
        })
        .collect();

    if mesh.bones.is_empty() {
        tracing::info!("Mesh '{}' has no bones", mesh.name);
    }

    for bone in &mesh.bones {
        let bone_id = bones.register(&bone.name)?;
        let node = root
            .find(&bone.name)
            .ok_or_else(|| CompileError::MissingBoneNode(bone.name.clone()))?;
        records.insert(
            bone_id,
            BoneRecord {
                bone_id,
                offset: bone.offset,
                bind_transform: node.transform,
            },
        );
    }

    let mut dropped = 0usize;
    for bone in &mesh.bones {
        let bone_id = bones.lookup(&bone.name)?;
        for weight in &bone.weights {
            let vertex_count = vertices.len();
            let vertex = vertices.get_mut(weight.vertex as usize).ok_or_else(|| {
                CompileError::WeightVertexOutOfRange {
                    mesh: mesh.name.clone(),
                    bone: bone.name.clone(),
                    vertex: weight.vertex,
                    vertex_count,
                }
            })?;
            if !vertex.add_influence(bone_id, weight.weight) {
                dropped += 1;
            }
        }
    }
    if dropped > 0 {
        tracing::warn!(
            "Mesh '{}': dropped {} influences beyond 4 per vertex",
            mesh.name,
            dropped
        );
    }

    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
    for (face_index, face) in mesh.faces.iter().enumerate() {
        if face.len() != 3 {
            return Err(CompileError::NonTriangleFace {
                mesh: mesh.name.clone(),
                face: face_index,
                sides: face.len(),
            });
        }
        indices.extend_from_slice(face);
    }

    tracing::debug!(
        "Compiled mesh '{}': {} vertices, {} triangles, {} bones",
        mesh.name,
        vertices.len(),
        mesh.faces.len(),
        mesh.bones.len()
    );

    Ok(Mesh { vertices, indices })
}

fn attribute<T: Copy>(values: &Option<Vec<T>>, index: usize) -> Option<T> {
    values.as_ref().and_then(|values| values.get(index).copied())
}
