//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, ShaderSourceMode};

/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "celestial", about = "Procedural star renderer")]
pub struct CliArgs {
    /// Star radius in world units.
    #[arg(long)]
    pub radius: Option<f64>,

    /// Color-ramp intensity (0.0 - 1.0).
    #[arg(long)]
    pub intensity: Option<f32>,

    /// Surface displacement amplitude.
    #[arg(long)]
    pub displacement: Option<f64>,

    /// Animation speed factor.
    #[arg(long)]
    pub time_multiplier: Option<f64>,

    /// Where to load star shaders from.
    #[arg(long, value_enum)]
    pub shader_source: Option<ShaderSourceMode>,

    /// Shader directory (implies `--shader-source files`).
    #[arg(long)]
    pub shader_dir: Option<PathBuf>,

    /// Shader base URL (implies `--shader-source url`).
    #[arg(long)]
    pub shader_url: Option<String>,

    /// Abandon shader loading after this many milliseconds.
    #[arg(long)]
    pub load_timeout_ms: Option<u64>,

    /// Number of frames to run.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Render through wgpu into an offscreen texture.
    #[arg(long)]
    pub gpu: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(radius) = args.radius {
            self.star.radius = radius;
        }
        if let Some(intensity) = args.intensity {
            self.star.intensity = intensity;
        }
        if let Some(displacement) = args.displacement {
            self.star.displacement = displacement;
        }
        if let Some(multiplier) = args.time_multiplier {
            self.star.time_multiplier = multiplier;
        }
        if let Some(ref dir) = args.shader_dir {
            self.shaders.directory = dir.clone();
            self.shaders.source = ShaderSourceMode::Files;
        }
        if let Some(ref url) = args.shader_url {
            self.shaders.base_url = url.clone();
            self.shaders.source = ShaderSourceMode::Url;
        }
        // An explicit mode wins over the one implied by a location flag.
        if let Some(mode) = args.shader_source {
            self.shaders.source = mode;
        }
        if let Some(timeout) = args.load_timeout_ms {
            self.shaders.load_timeout_ms = Some(timeout);
        }
        if let Some(frames) = args.frames {
            self.render.frames = frames;
        }
        if args.gpu {
            self.render.gpu = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
