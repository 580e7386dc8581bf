//! framegrab: headless screenshot demo
//!
//! Runs the screenshot state inside the headless host, presses Print Screen
//! on the requested frames and writes the resulting PNG files.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use framegrab::{
    capture::ScreenshotAppState,
    config::ScreenshotConfig,
    host::headless::HeadlessApp,
    model::KeyCode,
    util::{png_writer::PngFileHandler, storage::SystemStorage},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "framegrab")]
#[command(about = "Capture frame buffer screenshots from a headless render loop")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render frames and press Print Screen on selected ones
    Capture {
        /// Surface width in pixels
        #[arg(long, default_value_t = 1280)]
        width:          u32,
        /// Surface height in pixels
        #[arg(long, default_value_t = 720)]
        height:         u32,
        /// Number of frames to render
        #[arg(long, default_value_t = 10)]
        frames:         u64,
        /// Frame after which Print Screen is pressed (repeatable)
        #[arg(long = "trigger-frame", default_values_t = [0u64])]
        trigger_frames: Vec<u64>,
        /// Output directory prefix, including the trailing separator
        #[arg(long)]
        dir:            Option<String>,
        /// Base file name
        #[arg(long)]
        name:           Option<String>,
        /// PNG compression effort (0-100)
        #[arg(long)]
        quality:        Option<u8>,
        /// JSON configuration file
        #[arg(long)]
        config:         Option<PathBuf>,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

fn main() -> Result<()> {
    // Respects RUST_LOG, defaults to info for this crate
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("framegrab=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Capture {
            width,
            height,
            frames,
            trigger_frames,
            dir,
            name,
            quality,
            config,
        } => {
            let mut settings = match config {
                Some(path) => ScreenshotConfig::from_json_file(&path)?,
                None => ScreenshotConfig::default(),
            };
            if dir.is_some() {
                settings.directory = dir;
            }
            if name.is_some() {
                settings.base_name = name;
            }
            if let Some(quality) = quality {
                settings.quality = quality;
            }
            settings.validate()?;

            capture(width, height, frames, &trigger_frames, &settings)?;
        }
        Commands::Schema => {
            let schema = ScreenshotConfig::json_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn capture(
    width: u32,
    height: u32,
    frames: u64,
    trigger_frames: &[u64],
    settings: &ScreenshotConfig,
) -> Result<()> {
    let handler = PngFileHandler::new(SystemStorage::new()).with_quality(settings.quality);
    let written = handler.written_files();
    let state =
        ScreenshotAppState::with_naming_scheme(settings.naming_scheme()).with_handler(handler);

    let mut app = HeadlessApp::new(width, height);
    app.attach_state(Box::new(state.clone()));

    info!(width, height, frames, "Rendering headless frames");
    let tpf = 1.0 / 60.0;
    for frame in 0..frames {
        app.update(tpf)?;
        if trigger_frames.contains(&frame) {
            app.tap_key(KeyCode::SYSRQ);
        }
    }

    // A press after the last frame is captured by one more frame
    if state.is_capture_pending() {
        app.update(tpf)?;
    }

    for file in written.snapshot() {
        println!("{}", file.path.display());
    }
    info!(count = written.len(), "Finished");
    Ok(())
}
