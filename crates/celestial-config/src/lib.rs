//! Configuration for the celestial crates.
//!
//! Settings persist to disk as `config.ron`, missing fields fall back to
//! defaults, and command-line flags layer on top via clap.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, RenderConfig, ShaderConfig, ShaderSourceMode,
    StarConfig, default_config_dir,
};
pub use error::ConfigError;
