//! Compile session: shared registries plus the pack writers.
//!
//! One [`CompileContext`] is used for every model compiled together. Bone
//! ids, the hierarchy and the animation list accumulate across models, and
//! `bones.pack`/`animations.pack` are written once at the end.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use hashbrown::HashSet;
use rig_common::{
    Animation, BoneHierarchy, BoneId, Model, write_animations, write_hierarchy, write_model,
};

use crate::animation::compile_animations;
use crate::error::CompileError;
use crate::model::compile_model;
use crate::registry::{AnimationRegistry, BoneRegistry};
use crate::scene::Scene;
use crate::skeleton::build_skeleton;

/// State shared by every model of one compile session
#[derive(Debug, Default)]
pub struct CompileContext {
    bones: BoneRegistry,
    animation_ids: AnimationRegistry,
    visited: HashSet<BoneId>,
    hierarchy: BoneHierarchy,
    animations: Vec<Animation>,
}

impl CompileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile one scene: its model, its part of the skeleton and its clips.
    ///
    /// The model must be compiled first, since it registers the bones the
    /// skeleton pass and the animation channels resolve against.
    pub fn add_scene(&mut self, scene: &Scene) -> Result<Model, CompileError> {
        let model = compile_model(scene, &mut self.bones)?;
        build_skeleton(
            &scene.root,
            None,
            &self.bones,
            &mut self.visited,
            &mut self.hierarchy,
        );
        let clips = compile_animations(&scene.animations, &self.bones, &mut self.animation_ids)?;
        self.animations.extend(clips);

        tracing::info!(
            "Compiled scene: {} meshes, {} bones in model, {} bones in session, {} animations",
            model.meshes.len(),
            model.bones.len(),
            self.bones.len(),
            self.animations.len()
        );
        Ok(model)
    }

    pub fn bones(&self) -> &BoneRegistry {
        &self.bones
    }

    pub fn hierarchy(&self) -> &BoneHierarchy {
        &self.hierarchy
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    /// Write the session's hierarchy to `path`
    pub fn write_bones_pack(&self, path: &Path) -> Result<()> {
        write_pack(path, |w| write_hierarchy(w, &self.hierarchy))?;
        tracing::info!(
            "Wrote {:?}: {} bones, {} links",
            path,
            self.bones.len(),
            self.hierarchy.link_count()
        );
        Ok(())
    }

    /// Write every compiled animation to `path`
    pub fn write_animations_pack(&self, path: &Path) -> Result<()> {
        write_pack(path, |w| write_animations(w, &self.animations))?;
        tracing::info!("Wrote {:?}: {} animations", path, self.animations.len());
        Ok(())
    }
}

/// Write one compiled model to `path`
pub fn write_model_pack(model: &Model, path: &Path) -> Result<()> {
    write_pack(path, |w| write_model(w, model))?;
    tracing::info!(
        "Wrote {:?}: {} meshes, {} vertices, {} bones",
        path,
        model.meshes.len(),
        model.vertex_count(),
        model.bones.len()
    );
    Ok(())
}

fn write_pack(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?;
    let mut w = BufWriter::new(file);
    write(&mut w).with_context(|| format!("Failed to write {:?}", path))?;
    w.flush()
        .with_context(|| format!("Failed to flush {:?}", path))?;
    Ok(())
}
