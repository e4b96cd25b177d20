//! Animation compiler (scene clips -> animations.pack)
//!
//! Key times are converted from ticks to seconds here so the runtime only
//! ever sees seconds.

use rig_common::{Animation, KeyframeTrack, RotationKey, VectorKey};

use crate::error::CompileError;
use crate::registry::{AnimationRegistry, BoneRegistry};
use crate::scene::{NodeChannel, SceneAnimation, SceneVectorKey};

/// Compile the clips of one scene.
///
/// Clips whose name is already in `animation_ids` are skipped, so across a
/// session the first clip with a given name wins. Every channel must target
/// a registered bone.
pub fn compile_animations(
    animations: &[SceneAnimation],
    bones: &BoneRegistry,
    animation_ids: &mut AnimationRegistry,
) -> Result<Vec<Animation>, CompileError> {
    let mut compiled = Vec::new();

    for animation in animations {
        if animation_ids.get(&animation.name).is_some() {
            tracing::warn!(
                "Skipping animation '{}': name already compiled",
                animation.name
            );
            continue;
        }
        if !(animation.ticks_per_second > 0.0) {
            return Err(CompileError::InvalidTickRate {
                name: animation.name.clone(),
                ticks_per_second: animation.ticks_per_second,
            });
        }

        let tracks = animation
            .channels
            .iter()
            .map(|channel| compile_channel(channel, animation.ticks_per_second, bones))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(id) = animation_ids.register_new(&animation.name) else {
            continue;
        };
        let clip = Animation {
            id,
            duration: (animation.duration / animation.ticks_per_second) as f32,
            tracks,
        };

        tracing::debug!(
            "Compiled animation '{}' (id {}): {} tracks, {} keys, {:.2}s",
            animation.name,
            clip.id,
            clip.tracks.len(),
            clip.key_count(),
            clip.duration
        );
        compiled.push(clip);
    }

    Ok(compiled)
}

fn compile_channel(
    channel: &NodeChannel,
    ticks_per_second: f64,
    bones: &BoneRegistry,
) -> Result<KeyframeTrack, CompileError> {
    let bone_id = bones.lookup(&channel.node_name)?;
    let seconds_per_tick = 1.0 / ticks_per_second;

    Ok(KeyframeTrack {
        bone_id,
        translations: vector_keys(&channel.position_keys, seconds_per_tick),
        rotations: channel
            .rotation_keys
            .iter()
            .map(|key| RotationKey {
                time: (key.time * seconds_per_tick) as f32,
                value: key.value,
            })
            .collect(),
        scalings: vector_keys(&channel.scaling_keys, seconds_per_tick),
    })
}

fn vector_keys(keys: &[SceneVectorKey], seconds_per_tick: f64) -> Vec<VectorKey> {
    keys.iter()
        .map(|key| VectorKey {
            time: (key.time * seconds_per_tick) as f32,
            value: key.value,
        })
        .collect()
}
