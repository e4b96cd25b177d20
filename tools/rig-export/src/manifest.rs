//! Manifest parsing and build orchestration
//!
//! Parses rig.toml and compiles its models as one session.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use rig_common::{ANIMATIONS_PACK, BONES_PACK, MODELS_PACK};

use crate::compiler::{CompileContext, write_model_pack};
use crate::import::import_gltf;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    /// Compiled in order; bone and animation ids follow this order
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_bones_file")]
    pub bones: PathBuf,
    #[serde(default = "default_animations_file")]
    pub animations: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            bones: default_bones_file(),
            animations: default_animations_file(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("packs/")
}

fn default_bones_file() -> PathBuf {
    PathBuf::from(BONES_PACK)
}

fn default_animations_file() -> PathBuf {
    PathBuf::from(ANIMATIONS_PACK)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ModelEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        output: Option<PathBuf>,
    },
}

impl ModelEntry {
    pub fn path(&self) -> &Path {
        match self {
            ModelEntry::Simple(p) => p,
            ModelEntry::Detailed { path, .. } => path,
        }
    }

    /// Output file name for the model pack of the `index`-th entry
    pub fn output(&self, index: usize) -> PathBuf {
        if let ModelEntry::Detailed {
            output: Some(output),
            ..
        } = self
        {
            return output.clone();
        }
        if index == 0 {
            return PathBuf::from(MODELS_PACK);
        }
        let stem = self
            .path()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");
        PathBuf::from(format!("{}.{}", stem, MODELS_PACK))
    }
}

/// Load and parse a manifest file
///
/// Relative model paths are resolved against the manifest's directory.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let mut manifest = parse_manifest(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;

    if let Some(base) = path.parent() {
        for entry in &mut manifest.models {
            let resolved = base.join(entry.path());
            match entry {
                ModelEntry::Simple(p) => *p = resolved,
                ModelEntry::Detailed { path, .. } => *path = resolved,
            }
        }
        manifest.output.dir = base.join(&manifest.output.dir);
    }
    Ok(manifest)
}

/// Parse manifest text without touching the filesystem
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    Ok(toml::from_str(content)?)
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    if manifest.models.is_empty() {
        anyhow::bail!("Manifest lists no models");
    }

    let mut outputs = Vec::with_capacity(manifest.models.len());
    for (index, entry) in manifest.models.iter().enumerate() {
        if !entry.path().exists() {
            anyhow::bail!("Model source not found: {:?}", entry.path());
        }
        let output = entry.output(index);
        if outputs.contains(&output)
            || output == manifest.output.bones
            || output == manifest.output.animations
        {
            anyhow::bail!("Output file {:?} is written more than once", output);
        }
        outputs.push(output);
    }
    Ok(())
}

/// Build all packs from a manifest
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<()> {
    validate(manifest)?;

    let output_dir = output_override.unwrap_or(&manifest.output.dir);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut ctx = CompileContext::new();
    for (index, entry) in manifest.models.iter().enumerate() {
        let output = output_dir.join(entry.output(index));
        tracing::info!("Compiling model: {:?} -> {:?}", entry.path(), output);

        let scene = import_gltf(entry.path())?;
        let model = ctx
            .add_scene(&scene)
            .with_context(|| format!("Failed to compile {:?}", entry.path()))?;
        write_model_pack(&model, &output)?;
    }

    ctx.write_bones_pack(&output_dir.join(&manifest.output.bones))?;
    ctx.write_animations_pack(&output_dir.join(&manifest.output.animations))?;
    Ok(())
}
