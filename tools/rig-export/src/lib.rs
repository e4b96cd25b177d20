//! rig-export library
//!
//! Compiles skinned scenes into the binary packs read by `rig-common`:
//! one `models.pack` per model plus a `bones.pack` and `animations.pack`
//! shared by every model of the session.

pub mod animation;
pub mod compiler;
pub mod error;
pub mod import;
pub mod manifest;
pub mod model;
pub mod registry;
pub mod scene;
pub mod skeleton;

pub use compiler::{CompileContext, write_model_pack};
pub use error::CompileError;
pub use import::{import_gltf, import_gltf_slice};
pub use registry::{AnimationRegistry, BoneRegistry};
pub use scene::{Scene, SceneNode, print_nodes};

// Re-export the pack types so callers need only this crate
pub use rig_common::{
    Animation, BoneHierarchy, BoneId, Model, PackSet, ANIMATIONS_PACK, BONES_PACK, MODELS_PACK,
};
