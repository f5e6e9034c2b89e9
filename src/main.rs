//! Live camera effects application with filters, face overlays and photo capture.

use anyhow::{Context, Result};
use camera_effects::{
    adjustments::StyleFilter,
    app,
    config::{Config, EXAMPLE_CONFIG},
    placement::OverlayKind,
    ui::KEY_HELP,
};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use
    #[arg(long)]
    cam: Option<i32>,

    /// Video file to play instead of a camera
    #[arg(short, long)]
    video: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Directory saved photos are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Overlay at startup (none, mustache, glasses, hat, all)
    #[arg(long)]
    overlay: Option<String>,

    /// Style filter at startup (none, grayscale, sepia, invert, pixelated)
    #[arg(short, long)]
    filter: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Write the example configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    if let Some(path) = &args.write_config {
        std::fs::write(path, EXAMPLE_CONFIG).with_context(|| format!("writing {}", path.display()))?;
        println!("Example configuration written to {}", path.display());
        return Ok(());
    }

    info!("Camera Effects");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).unwrap_or_else(|e| {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            })
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, args)?;
    config.validate()?;

    println!("{KEY_HELP}");
    app::run(config)?;
    Ok(())
}

fn apply_overrides(config: &mut Config, args: Args) -> Result<()> {
    if let Some(index) = args.cam {
        config.camera.index = index;
    }
    if args.video.is_some() {
        config.camera.video_file = args.video;
    }
    if let Some(dir) = args.output_dir {
        config.capture.output_dir = dir;
    }
    if let Some(name) = args.overlay {
        config.overlays.initial =
            OverlayKind::from_str(&name).with_context(|| format!("unknown overlay '{name}'"))?;
    }
    if let Some(name) = args.filter {
        config.display.initial_filter =
            StyleFilter::from_str(&name).with_context(|| format!("unknown filter '{name}'"))?;
    }
    Ok(())
}
