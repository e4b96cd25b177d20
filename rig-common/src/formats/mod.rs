//! Rig pack binary formats
//!
//! Three POD streams, no magic bytes and no version field - the file name
//! determines the format:
//!
//! - `models.pack` - meshes, root transform and bone records ([`model`])
//! - `bones.pack` - fixed-capacity parent -> children table ([`hierarchy`])
//! - `animations.pack` - keyframe clips until end of file ([`animation`])
//!
//! All integers and floats are little-endian. Matrices are stored row-major
//! as 16 consecutive `f32`.

pub mod animation;
pub mod hierarchy;
pub mod model;
mod serialization;

pub use animation::*;
pub use hierarchy::*;
pub use model::*;
pub use serialization::{DecodeError, PackReader};

/// Dense bone identifier, `0..MAX_BONES`. Stored as `s32` on disk.
pub type BoneId = i32;

/// Animation identifier assigned by name at compile time.
pub type AnimationId = i32;

/// Fixed bone capacity shared by the registry, the hierarchy table and the
/// skinning matrix array.
pub const MAX_BONES: usize = 100;

/// Bone influence slots per vertex.
pub const MAX_BONE_INFLUENCES: usize = 4;

/// Bone id marking an unused vertex influence slot.
pub const UNSET_BONE: BoneId = -1;

/// Default file names written by the exporter
pub const MODELS_PACK: &str = "models.pack";
pub const BONES_PACK: &str = "bones.pack";
pub const ANIMATIONS_PACK: &str = "animations.pack";

/// Convert a stored bone id into a table index, rejecting ids outside the
/// fixed capacity.
pub fn bone_index(id: BoneId) -> Option<usize> {
    usize::try_from(id).ok().filter(|&index| index < MAX_BONES)
}
