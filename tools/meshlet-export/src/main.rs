//! meshlet-export - meshlet build tool
//!
//! Splits OBJ meshes into meshlets and writes packed descriptor buffers
//! (.meshlets) for mesh-shader pipelines.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use meshlet_common::LayoutKind;
use meshlet_export::format::MESHLET_EXT;
use meshlet_export::{ExportManifest, Overrides, build_file, load_manifest, read_file, verify_file};

#[derive(Parser)]
#[command(name = "meshlet-export")]
#[command(about = "Meshlet build tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build meshlets for an OBJ mesh
    Build {
        /// Input OBJ file
        input: PathBuf,

        /// Output .meshlets file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to meshlet.toml manifest
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum distinct vertices per meshlet
        #[arg(long)]
        max_vertices: Option<u32>,

        /// Maximum primitives per meshlet
        #[arg(long)]
        max_primitives: Option<u32>,

        /// Descriptor layout (basic or delta)
        #[arg(long)]
        layout: Option<LayoutKind>,

        /// Delta block budget in bits (implies --layout delta)
        #[arg(long)]
        max_block_bits: Option<u32>,

        /// Validate the result before writing it
        #[arg(long)]
        verify: bool,
    },

    /// Check a .meshlets file against its source OBJ
    Verify {
        /// Input .meshlets file
        meshlets: PathBuf,

        /// Source OBJ file
        input: PathBuf,
    },

    /// Print a summary of a .meshlets file
    Info {
        /// Input .meshlets file
        meshlets: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            config,
            max_vertices,
            max_primitives,
            layout,
            max_block_bits,
            verify,
        } => {
            let mut manifest = match config {
                Some(path) => load_manifest(&path)?,
                None => ExportManifest::default(),
            };
            manifest.apply(&Overrides {
                max_vertices,
                max_primitives,
                layout,
                max_block_bits,
                verify,
            });

            let output = output.unwrap_or_else(|| input.with_extension(MESHLET_EXT));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            let stats = build_file(&input, &output, &manifest)?;
            tracing::info!("{}", stats);
            tracing::info!("Done!");
        }

        Commands::Verify { meshlets, input } => {
            tracing::info!("Verifying {:?} against {:?}", meshlets, input);
            verify_file(&meshlets, &input)?;
        }

        Commands::Info { meshlets } => {
            let file = read_file(&meshlets)?;
            let header = file.header;
            println!("{}", meshlets.display());
            println!("  layout:       {:?}", header.layout);
            println!("  meshlets:     {}", header.meshlet_count);
            println!("  descriptors:  {}", header.desc_count);
            println!("  pack words:   {}", header.pack_word_count);
            println!("  vertices:     {}", header.vertex_count);
            println!("  file size:    {} bytes", header.file_size());
        }
    }

    Ok(())
}
