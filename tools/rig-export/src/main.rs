//! rig-export - skinned model and animation compiler
//!
//! Converts glTF/GLB scenes into binary packs
//! (models.pack, bones.pack, animations.pack)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rig_export::{
    manifest, print_nodes, write_model_pack, CompileContext, PackSet, ANIMATIONS_PACK, BONES_PACK,
    MODELS_PACK,
};

#[derive(Parser)]
#[command(name = "rig-export")]
#[command(about = "Skinned model and animation pack compiler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build packs from a manifest file
    Build {
        /// Path to rig.toml manifest
        #[arg(default_value = "rig.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without building
    Check {
        /// Path to rig.toml manifest
        #[arg(default_value = "rig.toml")]
        manifest: PathBuf,
    },

    /// Compile a single scene into a pack directory
    Compile {
        /// Input scene file (glTF/GLB)
        input: PathBuf,

        /// Output directory for the three packs
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Print a scene's node tree with local transforms
    Inspect {
        /// Input scene file (glTF/GLB)
        input: PathBuf,
    },

    /// Load a pack directory and optionally sample a pose
    Verify {
        /// Directory holding models.pack, bones.pack and animations.pack
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Animation id to sample
        #[arg(short, long)]
        animation: Option<i32>,

        /// Time in seconds to sample at
        #[arg(short, long, default_value_t = 0.0)]
        time: f32,
    },
}

fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building packs from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Compile { input, output } => {
            tracing::info!("Compiling {:?} -> {:?}", input, output);
            std::fs::create_dir_all(&output)
                .with_context(|| format!("Failed to create output directory: {:?}", output))?;

            let scene = rig_export::import_gltf(&input)?;
            let mut ctx = CompileContext::new();
            let model = ctx
                .add_scene(&scene)
                .with_context(|| format!("Failed to compile {:?}", input))?;

            write_model_pack(&model, &output.join(MODELS_PACK))?;
            ctx.write_bones_pack(&output.join(BONES_PACK))?;
            ctx.write_animations_pack(&output.join(ANIMATIONS_PACK))?;
            tracing::info!("Done!");
        }

        Commands::Inspect { input } => {
            let scene = rig_export::import_gltf(&input)?;
            let mut dump = String::new();
            print_nodes(&scene.root, 0, &mut dump)?;
            print!("{}", dump);
        }

        Commands::Verify {
            dir,
            animation,
            time,
        } => {
            let packs = PackSet::load_dir(&dir)?;
            println!(
                "meshes={} vertices={} bones={} links={} animations={}",
                packs.model.meshes.len(),
                packs.model.vertex_count(),
                packs.model.bones.len(),
                packs.hierarchy.link_count(),
                packs.animations.len()
            );

            if let Some(id) = animation {
                let clip = packs
                    .animation(id)
                    .with_context(|| format!("No animation with id {} in {:?}", id, dir))?;
                let mut transforms = PackSet::skinning_matrices();
                packs.sample(Some(clip), time, &mut transforms)?;

                for record in &packs.model.bones {
                    let Some(slot) = rig_common::bone_index(record.bone_id) else {
                        continue;
                    };
                    let m = transforms[slot].transpose().to_cols_array();
                    println!("bone {}: {:?}", record.bone_id, m);
                }
            }
        }
    }

    Ok(())
}

