//! Runtime loader for a set of rig packs.
//!
//! Each pack is read fully into memory and decoded in one pass. The decoded
//! [`PackSet`] owns everything it references and is never mutated after
//! loading; dropping it releases all of it at once.

use std::io;
use std::path::{Path, PathBuf};

use glam::Mat4;

use crate::formats::{
    ANIMATIONS_PACK, Animation, AnimationId, BONES_PACK, BoneHierarchy, DecodeError, MAX_BONES,
    MODELS_PACK, Model, read_animations,
};
use crate::pose::{PoseError, SkinningMatrices, sample_pose};

/// Errors produced while loading a pack set
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt or mismatched pack {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// Model, hierarchy and animations loaded together
#[derive(Debug, Clone, PartialEq)]
pub struct PackSet {
    pub model: Model,
    pub hierarchy: BoneHierarchy,
    pub animations: Vec<Animation>,
}

impl PackSet {
    /// Load `models.pack`, `bones.pack` and `animations.pack` from `dir`
    pub fn load_dir(dir: &Path) -> Result<Self, LoadError> {
        Self::load(
            &dir.join(MODELS_PACK),
            &dir.join(BONES_PACK),
            &dir.join(ANIMATIONS_PACK),
        )
    }

    /// Load three packs from explicit paths
    pub fn load(model: &Path, bones: &Path, animations: &Path) -> Result<Self, LoadError> {
        let model = decode_file(model, Model::from_bytes)?;
        let hierarchy = decode_file(bones, BoneHierarchy::from_bytes)?;
        let animations = decode_file(animations, read_animations)?;

        tracing::info!(
            "Loaded rig: {} meshes, {} vertices, {} bones, {} animations",
            model.meshes.len(),
            model.vertex_count(),
            model.bones.len(),
            animations.len()
        );

        Ok(Self {
            model,
            hierarchy,
            animations,
        })
    }

    /// Decode from in-memory buffers, such as packs embedded in a binary.
    ///
    /// Errors carry no file name; use [`PackSet::load`] for files on disk.
    pub fn from_bytes(model: &[u8], bones: &[u8], animations: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            model: Model::from_bytes(model)?,
            hierarchy: BoneHierarchy::from_bytes(bones)?,
            animations: read_animations(animations)?,
        })
    }

    /// Look up an animation by id
    pub fn animation(&self, id: AnimationId) -> Option<&Animation> {
        self.animations.iter().find(|animation| animation.id == id)
    }

    /// Fresh output buffer for [`PackSet::sample`]
    pub fn skinning_matrices() -> SkinningMatrices {
        [Mat4::IDENTITY; MAX_BONES]
    }

    /// Pose the whole skeleton for `animation` at time `t`
    pub fn sample(
        &self,
        animation: Option<&Animation>,
        t: f32,
        final_transforms: &mut SkinningMatrices,
    ) -> Result<(), PoseError> {
        sample_pose(&self.model, animation, t, &self.hierarchy, final_transforms)
    }
}

fn decode_file<T>(
    path: &Path,
    decode: impl FnOnce(&[u8]) -> Result<T, DecodeError>,
) -> Result<T, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{
        BoneRecord, KeyframeTrack, Mesh, VectorKey, Vertex, write_animations, write_hierarchy,
        write_model,
    };
    use glam::Vec3;
    use tempfile::tempdir;

    fn write_set(dir: &Path) -> PackSet {
        let model = Model {
            meshes: vec![Mesh {
                vertices: vec![Vertex::default(); 3],
                indices: vec![0, 1, 2],
            }],
            root_transform: Mat4::IDENTITY,
            root_bone_id: 0,
            bones: vec![BoneRecord {
                bone_id: 0,
                offset: Mat4::IDENTITY,
                bind_transform: Mat4::IDENTITY,
            }],
        };
        let hierarchy = BoneHierarchy::new();
        let animations = vec![Animation {
            id: 0,
            duration: 1.0,
            tracks: vec![KeyframeTrack {
                bone_id: 0,
                translations: vec![VectorKey {
                    time: 0.0,
                    value: Vec3::X,
                }],
                ..KeyframeTrack::default()
            }],
        }];

        let mut bytes = Vec::new();
        write_model(&mut bytes, &model).unwrap();
        std::fs::write(dir.join(MODELS_PACK), &bytes).unwrap();

        bytes.clear();
        write_hierarchy(&mut bytes, &hierarchy).unwrap();
        std::fs::write(dir.join(BONES_PACK), &bytes).unwrap();

        bytes.clear();
        write_animations(&mut bytes, &animations).unwrap();
        std::fs::write(dir.join(ANIMATIONS_PACK), &bytes).unwrap();

        PackSet {
            model,
            hierarchy,
            animations,
        }
    }

    #[test]
    fn test_load_dir_roundtrip() {
        let dir = tempdir().expect("Failed to create temp dir");
        let expected = write_set(dir.path());

        let loaded = PackSet::load_dir(dir.path()).unwrap();
        assert_eq!(loaded, expected);
        assert!(loaded.animation(0).is_some());
        assert!(loaded.animation(1).is_none());

        let mut out = PackSet::skinning_matrices();
        loaded.sample(loaded.animation(0), 0.5, &mut out).unwrap();
        assert!(out[0].abs_diff_eq(Mat4::from_translation(Vec3::X), 1e-6));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempdir().expect("Failed to create temp dir");
        let err = PackSet::load_dir(dir.path()).unwrap_err();
        match err {
            LoadError::Io { path, .. } => assert!(path.ends_with(MODELS_PACK)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_bytes_matches_load() {
        let dir = tempdir().expect("Failed to create temp dir");
        let expected = write_set(dir.path());

        let read = |name: &str| std::fs::read(dir.path().join(name)).unwrap();
        let model = read(MODELS_PACK);
        let bones = read(BONES_PACK);
        let animations = read(ANIMATIONS_PACK);

        let decoded = PackSet::from_bytes(&model, &bones, &animations).unwrap();
        assert_eq!(decoded, expected);

        // Truncated hierarchy and animation buffers are decode errors
        assert!(matches!(
            PackSet::from_bytes(&model, &bones[..bones.len() - 4], &animations),
            Err(DecodeError::UnexpectedEof { .. })
        ));
        assert!(PackSet::from_bytes(&model, &bones, &animations[..animations.len() - 3]).is_err());
    }

    #[test]
    fn test_truncated_animation_pack_is_rejected() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_set(dir.path());

        let path = dir.path().join(ANIMATIONS_PACK);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 6]).unwrap();

        let err = PackSet::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }), "{err}");
    }
}
