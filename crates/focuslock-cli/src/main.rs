mod commands;
mod frames;
mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "focuslock", about = "Focus lock offset estimation tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (TOML); missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the offset between two images
    Offset(commands::offset::OffsetArgs),
    /// Estimate the offset of a raw packed camera buffer
    Packed(commands::packed::PackedArgs),
    /// Track a sequence of frames against a reference
    Track(commands::track::TrackArgs),
    /// Fit a Gaussian spot in an image
    Spot(commands::spot::SpotArgs),
    /// Print or save the default settings
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = frames::load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Offset(args) => commands::offset::run(args, &config),
        Commands::Packed(args) => commands::packed::run(args, &config),
        Commands::Track(args) => commands::track::run(args, &config),
        Commands::Spot(args) => commands::spot::run(args, &config),
        Commands::Config(args) => commands::config::run(args, &config),
    }
}
