//! Animation pack format (animations.pack)
//!
//! Keyframe clips, one after another until end of file. Key times are in
//! seconds; tick units never reach the runtime.
//!
//! # Layout
//! ```text
//! repeat (until EOF):
//!   s32 id
//!   f32 duration_seconds
//!   u32 bone_track_count
//!   repeat bone_track_count:
//!     s32 bone_id
//!     u32 translation_count, u32 rotation_count, u32 scaling_count
//!     translation_count x { f32 time, 3 x f32 }
//!     rotation_count    x { f32 time, 4 x f32 (w, x, y, z) }
//!     scaling_count     x { f32 time, 3 x f32 }
//! ```

use byteorder::{LittleEndian, WriteBytesExt};
use glam::{Quat, Vec3};
use std::io::{self, Write};

use super::serialization::{DecodeError, PackReader, write_quat, write_vec3};
use super::{AnimationId, BoneId};

/// Serialized size of a translation or scaling key
pub const VECTOR_KEY_SIZE: usize = 16;

/// Serialized size of a rotation key
pub const ROTATION_KEY_SIZE: usize = 20;

/// Translation or scaling key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorKey {
    pub time: f32,
    pub value: Vec3,
}

/// Rotation key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationKey {
    pub time: f32,
    pub value: Quat,
}

/// Keyframes for one bone. The three arrays are independent and each is
/// ascending in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyframeTrack {
    pub bone_id: BoneId,
    pub translations: Vec<VectorKey>,
    pub rotations: Vec<RotationKey>,
    pub scalings: Vec<VectorKey>,
}

/// Animation clip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Animation {
    pub id: AnimationId,
    /// Clip length in seconds
    pub duration: f32,
    pub tracks: Vec<KeyframeTrack>,
}

impl Animation {
    /// Track driving `bone_id`, if any (first match)
    pub fn track(&self, bone_id: BoneId) -> Option<&KeyframeTrack> {
        self.tracks.iter().find(|track| track.bone_id == bone_id)
    }

    /// Total number of keys across all tracks
    pub fn key_count(&self) -> usize {
        self.tracks
            .iter()
            .map(|t| t.translations.len() + t.rotations.len() + t.scalings.len())
            .sum()
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_i32::<LittleEndian>(self.id)?;
        w.write_f32::<LittleEndian>(self.duration)?;
        w.write_u32::<LittleEndian>(self.tracks.len() as u32)?;

        for track in &self.tracks {
            w.write_i32::<LittleEndian>(track.bone_id)?;
            w.write_u32::<LittleEndian>(track.translations.len() as u32)?;
            w.write_u32::<LittleEndian>(track.rotations.len() as u32)?;
            w.write_u32::<LittleEndian>(track.scalings.len() as u32)?;

            for key in &track.translations {
                w.write_f32::<LittleEndian>(key.time)?;
                write_vec3(w, key.value)?;
            }
            for key in &track.rotations {
                w.write_f32::<LittleEndian>(key.time)?;
                write_quat(w, key.value)?;
            }
            for key in &track.scalings {
                w.write_f32::<LittleEndian>(key.time)?;
                write_vec3(w, key.value)?;
            }
        }

        Ok(())
    }

    fn read(reader: &mut PackReader<'_>) -> Result<Self, DecodeError> {
        let id = reader.read_i32()?;
        let duration = reader.read_f32()?;
        // A track header is 16 bytes even with no keys
        let track_count = reader.read_count("bone track", 16)?;

        let mut tracks = Vec::with_capacity(track_count);
        for _ in 0..track_count {
            let bone_id = reader.read_i32()?;
            let translation_count = reader.read_u32()? as usize;
            let rotation_count = reader.read_u32()? as usize;
            let scaling_count = reader.read_u32()? as usize;

            let payload = translation_count
                .checked_mul(VECTOR_KEY_SIZE)
                .zip(rotation_count.checked_mul(ROTATION_KEY_SIZE))
                .zip(scaling_count.checked_mul(VECTOR_KEY_SIZE))
                .and_then(|((t, r), s)| t.checked_add(r)?.checked_add(s));
            match payload {
                Some(size) if size <= reader.remaining() => {}
                _ => {
                    return Err(DecodeError::UnexpectedEof {
                        offset: reader.offset(),
                        needed: payload.unwrap_or(usize::MAX),
                        remaining: reader.remaining(),
                    });
                }
            }

            let translations = read_vector_keys(reader, translation_count)?;
            let rotations = (0..rotation_count)
                .map(|_| -> Result<RotationKey, DecodeError> {
                    Ok(RotationKey {
                        time: reader.read_f32()?,
                        value: reader.read_quat()?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let scalings = read_vector_keys(reader, scaling_count)?;

            tracks.push(KeyframeTrack {
                bone_id,
                translations,
                rotations,
                scalings,
            });
        }

        Ok(Self {
            id,
            duration,
            tracks,
        })
    }
}

fn read_vector_keys(
    reader: &mut PackReader<'_>,
    count: usize,
) -> Result<Vec<VectorKey>, DecodeError> {
    (0..count)
        .map(|_| -> Result<VectorKey, DecodeError> {
            Ok(VectorKey {
                time: reader.read_f32()?,
                value: reader.read_vec3()?,
            })
        })
        .collect()
}

/// Write every clip back to back
pub fn write_animations<W: Write>(w: &mut W, animations: &[Animation]) -> io::Result<()> {
    for animation in animations {
        animation.write(w)?;
    }
    Ok(())
}

/// Decode a complete animations.pack buffer.
///
/// Clips are read until the buffer is exhausted; a clip cut short anywhere
/// fails the whole decode.
pub fn read_animations(bytes: &[u8]) -> Result<Vec<Animation>, DecodeError> {
    let mut reader = PackReader::new(bytes);
    let mut animations = Vec::new();

    while !reader.is_empty() {
        animations.push(Animation::read(&mut reader)?);
    }

    reader.finish()?;
    Ok(animations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_clip(id: AnimationId) -> Animation {
        Animation {
            id,
            duration: 1.25,
            tracks: vec![
                KeyframeTrack {
                    bone_id: 0,
                    translations: vec![
                        VectorKey {
                            time: 0.0,
                            value: Vec3::ZERO,
                        },
                        VectorKey {
                            time: 1.25,
                            value: Vec3::new(0.0, 0.0, 2.0),
                        },
                    ],
                    rotations: vec![RotationKey {
                        time: 0.0,
                        value: Quat::from_rotation_y(0.5),
                    }],
                    scalings: vec![VectorKey {
                        time: 0.0,
                        value: Vec3::ONE,
                    }],
                },
                KeyframeTrack {
                    bone_id: 3,
                    translations: Vec::new(),
                    rotations: vec![
                        RotationKey {
                            time: 0.0,
                            value: Quat::IDENTITY,
                        },
                        RotationKey {
                            time: 0.5,
                            value: Quat::from_rotation_x(1.0),
                        },
                    ],
                    scalings: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_animations_roundtrip() {
        let clips = vec![walk_clip(0), walk_clip(1)];
        let mut bytes = Vec::new();
        write_animations(&mut bytes, &clips).unwrap();

        let parsed = read_animations(&bytes).unwrap();
        assert_eq!(parsed, clips);
        assert_eq!(parsed[0].key_count(), 6);
        assert_eq!(parsed[1].track(3).map(|t| t.rotations.len()), Some(2));
        assert!(parsed[1].track(7).is_none());
    }

    #[test]
    fn test_empty_pack_has_no_clips() {
        assert!(read_animations(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_pack_is_rejected() {
        let mut bytes = Vec::new();
        write_animations(&mut bytes, &[walk_clip(0), walk_clip(1)]).unwrap();

        // Cut the second clip in the middle of a key
        for cut in [1, 7, 13, bytes.len() / 2 + 3] {
            let truncated = &bytes[..bytes.len() - cut];
            assert!(
                read_animations(truncated).is_err(),
                "cut of {} bytes was accepted",
                cut
            );
        }
    }

    #[test]
    fn test_huge_key_count_is_rejected_without_allocating() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());

        assert!(matches!(
            read_animations(&bytes),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }
}
