// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "drive-recorder")]
#[command(about = "Dash-cam recorder with telemetry overlay")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Configuration file (default: ~/.config/drive-recorder/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where frames come from
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Default camera and microphone
    Camera,
    /// Synthetic color bars and tone
    Test,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a video
    Record {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Directory for the recording (default: from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Enable audio recording
        #[arg(short, long)]
        audio: bool,

        /// Record without the telemetry overlay
        #[arg(long)]
        no_overlay: bool,

        #[arg(short, long, value_enum, default_value = "camera")]
        source: SourceKind,

        /// Speed shown in the overlay (km/h)
        #[arg(long, default_value = "0")]
        speed: f64,

        /// Latitude shown in the overlay
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        lat: f64,

        /// Longitude shown in the overlay
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        lon: f64,

        /// Altitude shown in the overlay (meters)
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        alt: f64,
    },

    /// List saved recordings, newest first
    List {
        /// Directory to list (default: from config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Take a still image
    Photo {
        /// Directory for the photo (default: from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "camera")]
        source: SourceKind,
    },

    /// Show installed encoders
    Encoders,

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=drive_recorder=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Record {
            duration,
            output,
            audio,
            no_overlay,
            source,
            speed,
            lat,
            lon,
            alt,
        } => cli::record(
            config,
            cli::RecordOptions {
                duration,
                output,
                audio,
                overlay: !no_overlay,
                source,
                telemetry: (speed, lat, lon, alt),
            },
        ),
        Commands::List { dir } => cli::list_recordings(&config, dir),
        Commands::Photo { output, source } => cli::take_photo(config, output, source),
        Commands::Encoders => cli::list_encoders(),
        Commands::Config => cli::show_config(&config),
    }
}
