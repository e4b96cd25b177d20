//! Compile errors.
//!
//! Every variant is fatal for the compile session; the CLI reports it and
//! exits non-zero.

use rig_common::MAX_BONES;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("bone registry is full: '{name}' would exceed {max} bones", max = MAX_BONES)]
    BoneCapacityExceeded { name: String },

    #[error("bone '{0}' was never registered")]
    UnknownBone(String),

    #[error("bone '{0}' has no node in the scene tree")]
    MissingBoneNode(String),

    #[error("mesh '{mesh}' face {face} has {sides} sides, only triangles are supported")]
    NonTriangleFace {
        mesh: String,
        face: usize,
        sides: usize,
    },

    #[error("mesh '{mesh}' bone '{bone}' weights vertex {vertex}, but the mesh has {vertex_count} vertices")]
    WeightVertexOutOfRange {
        mesh: String,
        bone: String,
        vertex: u32,
        vertex_count: usize,
    },

    #[error("scene has no node named after a registered bone")]
    NoRootBone,

    #[error("animation '{name}' has invalid ticks per second {ticks_per_second}")]
    InvalidTickRate { name: String, ticks_per_second: f64 },
}
