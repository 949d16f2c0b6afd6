// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use data_collection::config::DetectOverrides;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "data-collection")]
#[command(about = "Webcam dataset capture and motion-triggered snapshots")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture center-cropped images into numbered dataset folders
    Collect {
        /// Camera index to use (from 'data-collection list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Folder the dataset_N folders are created in
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Prefill: number of datasets
        #[arg(long)]
        datasets: Option<u32>,

        /// Prefill: images per dataset
        #[arg(long)]
        images: Option<u32>,

        /// Prefill: image width
        #[arg(long)]
        width: Option<u32>,

        /// Prefill: image height
        #[arg(long)]
        height: Option<u32>,
    },

    /// Save frames that differ from the previous frame
    Detect {
        /// Camera index to use (from 'data-collection list')
        #[arg(short, long, conflicts_with = "source")]
        camera: Option<usize>,

        /// Replay images from a folder instead of a camera
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Restart the folder from the beginning when it runs out
        #[arg(long = "loop", requires = "source")]
        looping: bool,

        /// Snapshot folder (default: captured_changes)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Changed-pixel count a frame must exceed (default: 500)
        #[arg(short, long)]
        threshold: Option<u64>,

        /// Grayscale difference a pixel must exceed (default: 30)
        #[arg(long)]
        pixel_threshold: Option<u8>,

        /// Pause between frames in milliseconds (default: 500)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Show the difference mask in the terminal
        #[arg(short, long)]
        preview: bool,
    },

    /// List available cameras
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=data_collection=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            camera,
            output,
            datasets,
            images,
            width,
            height,
        } => cli::collect(cli::CollectArgs {
            camera,
            output,
            datasets,
            images,
            width,
            height,
        }),
        Commands::Detect {
            camera,
            source,
            looping,
            output,
            threshold,
            pixel_threshold,
            interval_ms,
            preview,
        } => cli::detect(cli::DetectArgs {
            overrides: DetectOverrides {
                camera,
                output,
                threshold,
                pixel_threshold,
                interval_ms,
            },
            source,
            looping,
            preview,
        }),
        Commands::List => cli::list_cameras(),
    }
}
