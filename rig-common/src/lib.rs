//! Shared types and utilities for rig packs
//!
//! This crate provides the pieces shared between:
//! - `rig-export` (asset pipeline, writes the packs)
//! - runtimes that load the packs and drive skinning
//!
//! # Modules
//!
//! - [`formats`] - Binary pack formats (models, bones, animations)
//! - [`loader`] - One-shot loader for a directory of packs
//! - [`pose`] - Pose sampler producing per-bone skinning matrices
//! - [`clock`] - Playback clock that loops a clip by resetting time

pub mod clock;
pub mod formats;
pub mod loader;
pub mod pose;

pub use clock::AnimationClock;
pub use loader::{LoadError, PackSet};
pub use pose::{PoseError, SkinningMatrices, sample_bone, sample_pose};

// Re-export commonly used format items
pub use formats::{
    ANIMATIONS_PACK,
    Animation,
    AnimationId,
    BONES_PACK,
    BoneHierarchy,
    BoneId,
    BoneRecord,
    DecodeError,
    KeyframeTrack,
    // Constants
    MAX_BONE_INFLUENCES,
    MAX_BONES,
    MODELS_PACK,
    Mesh,
    Model,
    PackReader,
    RotationKey,
    UNSET_BONE,
    VectorKey,
    Vertex,
    bone_index,
    // Readers
    read_animations,
    // Writers
    write_animations,
    write_hierarchy,
    write_model,
};
