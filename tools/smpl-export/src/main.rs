//! smpl-export - SMPL rig export tool
//!
//! Extracts rest-pose bone positions as Rust constants and converts rig
//! animation into compact keyframe JSON clips.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use smpl_export::scene::gltf_scene::DEFAULT_FRAME_RATE;
use smpl_export::scene::GltfLoader;
use smpl_export::{animation, rest_pose, AnimationClip, BoneTable, ConvertOptions};

#[derive(Parser)]
#[command(name = "smpl-export")]
#[command(about = "SMPL rig export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract rest-pose bone positions as Rust constants
    RestPose {
        /// Input rig file (glTF/GLB)
        input: PathBuf,

        /// Output .rs file
        #[arg(short, long)]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Convert the rig's animation clip to keyframe JSON
    Animation {
        /// Input rig file (glTF/GLB)
        input: PathBuf,

        /// Output .json file (default: input with .json extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Clip name (default: input file stem)
        #[arg(long)]
        name: Option<String>,

        /// Frame step (2 samples a 30fps source at 15fps)
        #[arg(long, default_value_t = smpl_export::DEFAULT_FRAME_STEP,
              value_parser = clap::value_parser!(u32).range(1..))]
        step: u32,

        /// Frame rate for sampling the source clip
        #[arg(short, long, default_value_t = DEFAULT_FRAME_RATE)]
        frame_rate: f32,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Summarize a converted clip
    Inspect {
        /// Clip .json file
        input: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let table = BoneTable::smpl();

    match cli.command {
        Commands::RestPose {
            input,
            output,
            verbose,
        } => {
            init_logging(verbose);
            tracing::info!("Extracting rest pose {:?} -> {:?}", input, output);
            rest_pose::export_rest_pose(&mut GltfLoader::default(), &input, &output, &table)
                .with_context(|| format!("Rest pose export failed for {:?}", input))?;
            tracing::info!("Success: {:?}", output);
        }

        Commands::Animation {
            input,
            output,
            name,
            step,
            frame_rate,
            verbose,
        } => {
            init_logging(verbose);
            let output = output.unwrap_or_else(|| animation::default_output_path(&input));
            tracing::info!("Converting animation {:?} -> {:?}", input, output);

            let options = ConvertOptions {
                name,
                frame_step: step,
            };
            animation::export_animation(
                &mut GltfLoader::new(frame_rate),
                &input,
                &output,
                &options,
                &table,
            )
            .with_context(|| format!("Animation export failed for {:?}", input))?;
            tracing::info!("Success: {:?}", output);
        }

        Commands::Inspect { input } => {
            init_logging(false);
            let json = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {:?}", input))?;
            let clip = AnimationClip::from_json(&json)
                .with_context(|| format!("Failed to parse clip {:?}", input))?;
            inspect_clip(&clip, &table);
        }
    }

    Ok(())
}

fn inspect_clip(clip: &AnimationClip, table: &BoneTable) {
    tracing::info!(
        "Clip '{}' (v{}): {} keyframes, {:.3}s",
        clip.name,
        clip.version,
        clip.keyframes.len(),
        clip.duration
    );

    let with_root = clip
        .keyframes
        .iter()
        .filter(|kf| kf.pose.root_position.is_some())
        .count();
    tracing::info!("  root offset in {} keyframes", with_root);

    for entry in table.entries() {
        let count = clip
            .keyframes
            .iter()
            .filter(|kf| kf.pose.contains(entry.key))
            .count();
        if count > 0 {
            tracing::info!("  {:>3} {:<12} {} keyframes", entry.key, entry.source_name, count);
        }
    }
}
