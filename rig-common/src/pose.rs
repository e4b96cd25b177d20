//! Pose sampler
//!
//! Composes the final skinning matrix of every bone reachable from a start
//! bone for one instant of an animation:
//!
//! ```text
//! local  = bind_transform, or TRS sampled from the bone's track
//! global = parent_global * local
//! final  = global * offset
//! ```
//!
//! The walk over the hierarchy is an explicit worklist of
//! `(bone_id, parent_global)` pairs held inline, so sampling never recurses
//! natively and never touches the heap.

use glam::{Mat4, Quat, Vec3};
use smallvec::SmallVec;

use crate::formats::{
    Animation, BoneHierarchy, BoneId, KeyframeTrack, MAX_BONES, Model, RotationKey, VectorKey,
    bone_index,
};

/// Output of the sampler: one matrix per bone id
pub type SkinningMatrices = [Mat4; MAX_BONES];

/// Errors raised while sampling a pose
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoseError {
    #[error("no bone record for bone id {0}")]
    MissingBoneRecord(BoneId),

    #[error("bone id {0} is outside the skinning matrix array")]
    BoneIdOutOfRange(BoneId),

    #[error("bone hierarchy visits more than {max} bones (cycle or shared child)", max = MAX_BONES)]
    HierarchyOverflow,

    #[error("sample time {0} is negative")]
    NegativeTime(f32),
}

/// A key in one of a track's three arrays
trait Keyframe {
    type Value: Copy;

    fn time(&self) -> f32;
    fn value(&self) -> Self::Value;
}

impl Keyframe for VectorKey {
    type Value = Vec3;

    fn time(&self) -> f32 {
        self.time
    }

    fn value(&self) -> Vec3 {
        self.value
    }
}

impl Keyframe for RotationKey {
    type Value = Quat;

    fn time(&self) -> f32 {
        self.time
    }

    fn value(&self) -> Quat {
        self.value
    }
}

/// Sample one key array at time `t`.
///
/// Before the first key the first value is held, after the last key the last
/// value is held, and a key hit exactly is returned untouched. Between keys
/// `interpolate(lo, hi, fraction)` is used. `None` for an empty array.
fn sample_keys<K: Keyframe>(
    keys: &[K],
    t: f32,
    interpolate: impl Fn(K::Value, K::Value, f32) -> K::Value,
) -> Option<K::Value> {
    let first = keys.first()?;
    if t <= first.time() {
        return Some(first.value());
    }

    for (index, hi) in keys.iter().enumerate() {
        if hi.time() > t {
            // index > 0: keys[0] is at or before t
            let lo = &keys[index - 1];
            let fraction = (t - lo.time()) / (hi.time() - lo.time());
            return Some(interpolate(lo.value(), hi.value(), fraction));
        }
        if hi.time() == t {
            return Some(hi.value());
        }
    }

    keys.last().map(Keyframe::value)
}

/// Translation at time `t` (linear)
pub fn sample_translation(keys: &[VectorKey], t: f32) -> Option<Vec3> {
    sample_keys(keys, t, |lo, hi, s| lo.lerp(hi, s))
}

/// Rotation at time `t` (spherical, shortest arc)
pub fn sample_rotation(keys: &[RotationKey], t: f32) -> Option<Quat> {
    sample_keys(keys, t, |lo, hi, s| lo.slerp(hi, s))
}

/// Scale at time `t` (linear)
pub fn sample_scaling(keys: &[VectorKey], t: f32) -> Option<Vec3> {
    sample_keys(keys, t, |lo, hi, s| lo.lerp(hi, s))
}

/// Local transform of a bone driven by `track`.
///
/// Each channel is sampled on its own; a channel without keys keeps the
/// matching component of the bind pose.
pub fn sample_local_transform(track: &KeyframeTrack, bind_transform: &Mat4, t: f32) -> Mat4 {
    let (bind_scale, bind_rotation, bind_translation) =
        bind_transform.to_scale_rotation_translation();

    let translation = sample_translation(&track.translations, t).unwrap_or(bind_translation);
    let rotation = sample_rotation(&track.rotations, t).unwrap_or(bind_rotation);
    let scale = sample_scaling(&track.scalings, t).unwrap_or(bind_scale);

    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// Sample `bone_id` and everything below it.
///
/// `parent_transform` is the global transform of the bone's parent. Results
/// go to `final_transforms[bone_id]` for each visited bone; slots for bones
/// outside the subtree are left as they were. With no animation every bone
/// takes its bind pose.
pub fn sample_bone(
    model: &Model,
    bone_id: BoneId,
    animation: Option<&Animation>,
    t: f32,
    hierarchy: &BoneHierarchy,
    parent_transform: Mat4,
    final_transforms: &mut SkinningMatrices,
) -> Result<(), PoseError> {
    if t < 0.0 {
        return Err(PoseError::NegativeTime(t));
    }

    let mut worklist: SmallVec<[(BoneId, Mat4); MAX_BONES]> = SmallVec::new();
    worklist.push((bone_id, parent_transform));
    let mut visited = 0usize;

    while let Some((bone_id, parent)) = worklist.pop() {
        visited += 1;
        if visited > MAX_BONES {
            return Err(PoseError::HierarchyOverflow);
        }

        let slot = bone_index(bone_id).ok_or(PoseError::BoneIdOutOfRange(bone_id))?;
        let record = model
            .bone(bone_id)
            .ok_or(PoseError::MissingBoneRecord(bone_id))?;

        let local = match animation.and_then(|anim| anim.track(bone_id)) {
            Some(track) => sample_local_transform(track, &record.bind_transform, t),
            None => record.bind_transform,
        };

        let global = parent * local;
        final_transforms[slot] = global * record.offset;

        // Reverse push keeps children in hierarchy order when popped
        let children = hierarchy.children(bone_id);
        if worklist.len() + children.len() > MAX_BONES {
            return Err(PoseError::HierarchyOverflow);
        }
        for &child in children.iter().rev() {
            worklist.push((child, global));
        }
    }

    Ok(())
}

/// Sample the whole skeleton of `model`, starting from its root bone under
/// its root transform.
pub fn sample_pose(
    model: &Model,
    animation: Option<&Animation>,
    t: f32,
    hierarchy: &BoneHierarchy,
    final_transforms: &mut SkinningMatrices,
) -> Result<(), PoseError> {
    sample_bone(
        model,
        model.root_bone_id,
        animation,
        t,
        hierarchy,
        model.root_transform,
        final_transforms,
    )
}
