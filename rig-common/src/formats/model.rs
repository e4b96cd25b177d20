//! Model pack format (models.pack)
//!
//! Meshes with skinned vertices, the scene root transform, the skeleton's
//! root bone and one record per bone referenced by the meshes.
//!
//! # Layout
//! ```text
//! u32 mesh_count
//! repeat mesh_count:
//!   u32 vertex_count
//!   vertex_count x Vertex (80 bytes, see below)
//!   u32 index_count
//!   index_count x u32
//! Matrix4 root_transform
//! u32 bone_count
//! s32 root_bone_id
//! repeat bone_count:
//!   s32 bone_id
//!   Matrix4 offset
//!   Matrix4 bind_transform
//! ```
//!
//! Vertex: `pos 3xf32, normal 3xf32, uv 2xf32, color 4xf32,
//! bone_ids 4xs32, bone_weights 4xf32`.

use byteorder::{LittleEndian, WriteBytesExt};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::io::{self, Write};

use super::serialization::{DecodeError, PackReader, write_f32s, write_mat4};
use super::{BoneId, MAX_BONE_INFLUENCES, UNSET_BONE, bone_index};

/// Size of one serialized vertex in bytes
pub const VERTEX_SIZE: usize = 80;

/// Size of one serialized bone record in bytes (id + two matrices)
pub const BONE_RECORD_SIZE: usize = 4 + 64 + 64;

/// Skinned vertex, laid out exactly as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    /// Influencing bones, [`UNSET_BONE`] for unused slots
    pub bone_ids: [BoneId; MAX_BONE_INFLUENCES],
    /// Raw weights as imported (never renormalized)
    pub bone_weights: [f32; MAX_BONE_INFLUENCES],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            uv: [0.0; 2],
            color: [1.0; 4],
            bone_ids: [UNSET_BONE; MAX_BONE_INFLUENCES],
            bone_weights: [0.0; MAX_BONE_INFLUENCES],
        }
    }
}

impl Vertex {
    /// Put an influence into the first unset slot.
    ///
    /// Returns `false` (leaving the vertex untouched) when all slots are
    /// already taken.
    pub fn add_influence(&mut self, bone_id: BoneId, weight: f32) -> bool {
        match self.bone_ids.iter().position(|&id| id == UNSET_BONE) {
            Some(slot) => {
                self.bone_ids[slot] = bone_id;
                self.bone_weights[slot] = weight;
                true
            }
            None => false,
        }
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_f32s(w, &self.position)?;
        write_f32s(w, &self.normal)?;
        write_f32s(w, &self.uv)?;
        write_f32s(w, &self.color)?;
        for &id in &self.bone_ids {
            w.write_i32::<LittleEndian>(id)?;
        }
        write_f32s(w, &self.bone_weights)
    }

    fn read(reader: &mut PackReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            position: reader.read_f32_array()?,
            normal: reader.read_f32_array()?,
            uv: reader.read_f32_array()?,
            color: reader.read_f32_array()?,
            bone_ids: reader.read_i32_array()?,
            bone_weights: reader.read_f32_array()?,
        })
    }
}

/// Triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Three indices per triangle
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Vertex data as raw bytes, ready for a GPU vertex buffer upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Per-bone data needed for skinning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneRecord {
    pub bone_id: BoneId,
    /// Inverse bind pose: mesh space -> bone space
    pub offset: Mat4,
    /// Rest pose of the bone node relative to its parent node
    pub bind_transform: Mat4,
}

/// Compiled model
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub root_transform: Mat4,
    pub root_bone_id: BoneId,
    pub bones: Vec<BoneRecord>,
}

impl Model {
    /// Find the record for a bone (first match)
    pub fn bone(&self, bone_id: BoneId) -> Option<&BoneRecord> {
        self.bones.iter().find(|bone| bone.bone_id == bone_id)
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.vertices.len()).sum()
    }

    /// Decode a complete models.pack buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = PackReader::new(bytes);

        let mesh_count = reader.read_u32()?;
        // Every mesh costs at least its two counts
        if (mesh_count as usize).saturating_mul(8) > reader.remaining() {
            return Err(DecodeError::CountTooLarge {
                what: "mesh",
                count: mesh_count,
                remaining: reader.remaining(),
            });
        }

        let mut meshes = Vec::with_capacity(mesh_count as usize);
        for _ in 0..mesh_count {
            let vertex_count = reader.read_count("vertex", VERTEX_SIZE)?;
            let vertices = (0..vertex_count)
                .map(|_| Vertex::read(&mut reader))
                .collect::<Result<Vec<_>, _>>()?;

            let index_count = reader.read_count("index", 4)?;
            let indices = (0..index_count)
                .map(|_| reader.read_u32())
                .collect::<Result<Vec<_>, _>>()?;

            meshes.push(Mesh { vertices, indices });
        }

        let root_transform = reader.read_mat4()?;
        let bone_count = reader.read_u32()?;
        let root_bone_id = reader.read_i32()?;
        if (bone_count as usize).saturating_mul(BONE_RECORD_SIZE) > reader.remaining() {
            return Err(DecodeError::CountTooLarge {
                what: "bone",
                count: bone_count,
                remaining: reader.remaining(),
            });
        }

        let mut bones = Vec::with_capacity(bone_count as usize);
        for _ in 0..bone_count {
            let bone_id = reader.read_i32()?;
            if bone_index(bone_id).is_none() {
                return Err(DecodeError::BoneIdOutOfRange(bone_id));
            }
            bones.push(BoneRecord {
                bone_id,
                offset: reader.read_mat4()?,
                bind_transform: reader.read_mat4()?,
            });
        }

        reader.finish()?;

        Ok(Self {
            meshes,
            root_transform,
            root_bone_id,
            bones,
        })
    }
}

/// Write a complete models.pack stream
pub fn write_model<W: Write>(w: &mut W, model: &Model) -> io::Result<()> {
    w.write_u32::<LittleEndian>(model.meshes.len() as u32)?;

    for mesh in &model.meshes {
        w.write_u32::<LittleEndian>(mesh.vertices.len() as u32)?;
        for vertex in &mesh.vertices {
            vertex.write(w)?;
        }

        w.write_u32::<LittleEndian>(mesh.indices.len() as u32)?;
        for &index in &mesh.indices {
            w.write_u32::<LittleEndian>(index)?;
        }
    }

    write_mat4(w, &model.root_transform)?;
    w.write_u32::<LittleEndian>(model.bones.len() as u32)?;
    w.write_i32::<LittleEndian>(model.root_bone_id)?;

    for bone in &model.bones {
        w.write_i32::<LittleEndian>(bone.bone_id)?;
        write_mat4(w, &bone.offset)?;
        write_mat4(w, &bone.bind_transform)?;
    }

    Ok(())
}
