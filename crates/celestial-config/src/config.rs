//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The star to build.
    pub star: StarConfig,
    /// Where star shader sources come from.
    pub shaders: ShaderConfig,
    /// Frame loop and offscreen target.
    pub render: RenderConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Appearance of a star. Colors are hex strings (`#rrggbb` or `#rgb`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarConfig {
    /// Sphere radius in world units.
    pub radius: f64,
    pub corona_color: String,
    pub core_color: String,
    pub inner_border_color: String,
    pub outer_border_color: String,
    /// First color-ramp breakpoint, nominally 0.0 - 1.0.
    pub intensity: f32,
    /// Surface displacement amplitude.
    pub displacement: f64,
    /// Animation speed factor applied to elapsed milliseconds.
    pub time_multiplier: f64,
    /// World position of the star.
    pub position: [f32; 3],
}

/// How the four star shaders are sourced.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ShaderSourceMode {
    /// The sources compiled into the binary.
    #[default]
    Inline,
    /// `<directory>/<name>.wgsl` on disk.
    Files,
    /// `<base_url>/<name>.wgsl` over HTTP.
    Url,
}

/// Shader sourcing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShaderConfig {
    pub source: ShaderSourceMode,
    /// Directory searched in `Files` mode.
    pub directory: PathBuf,
    /// Base URL used in `Url` mode.
    pub base_url: String,
    /// Give up on a shader batch after this many milliseconds. Unset waits
    /// indefinitely.
    pub load_timeout_ms: Option<u64>,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_seconds: u64,
}

/// Frame loop settings for the headless demo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Offscreen target width in pixels.
    pub width: u32,
    /// Offscreen target height in pixels.
    pub height: u32,
    /// Number of frames to simulate.
    pub frames: u32,
    /// Simulated time between frames in milliseconds.
    pub frame_interval_ms: u64,
    /// Camera orbit radius around the star.
    pub camera_distance: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Draw through wgpu into an offscreen texture.
    pub gpu: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log the slider table and current values at startup.
    pub show_sliders: bool,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            corona_color: "#ff9900".to_string(),
            core_color: "#fff2cc".to_string(),
            inner_border_color: "#ffffff".to_string(),
            outer_border_color: "#1a0000".to_string(),
            intensity: 0.5,
            displacement: 0.03,
            time_multiplier: 0.0005,
            position: [0.0; 3],
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            source: ShaderSourceMode::Inline,
            directory: PathBuf::from("shaders"),
            base_url: String::new(),
            load_timeout_ms: None,
            http_timeout_seconds: 30,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            frames: 120,
            frame_interval_ms: 16,
            camera_distance: 10.0,
            fov_degrees: 45.0,
            gpu: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_sliders: false,
        }
    }
}

/// Per-user configuration directory, e.g. `~/.config/celestial`.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("celestial"))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE_NAME), serialized)
            .map_err(ConfigError::WriteError)
    }

    /// Re-read the file: `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }
}
