//! Maps the shader configuration onto a loader and shader locations.

use std::time::Duration;

use celestial_bodies::{
    FileProvider, HttpProvider, InlineProvider, RoutingProvider, ShaderLocations,
    ShaderSourceLoader,
};
use celestial_config::{ShaderConfig, ShaderSourceMode};

/// A loader able to serve every sourcing mode, with the batch timeout from
/// `config` when one is set.
pub fn loader_for(config: &ShaderConfig) -> ShaderSourceLoader {
    let provider = RoutingProvider {
        files: FileProvider::new(),
        http: HttpProvider::new(Duration::from_secs(config.http_timeout_seconds.max(1))),
        inline: InlineProvider::star_defaults(),
    };
    let loader = ShaderSourceLoader::new(provider);
    match config.load_timeout_ms {
        Some(ms) => loader.with_timeout(Duration::from_millis(ms)),
        None => loader,
    }
}

pub fn locations_for(config: &ShaderConfig) -> ShaderLocations {
    match config.source {
        ShaderSourceMode::Inline => ShaderLocations::inline(),
        ShaderSourceMode::Files => ShaderLocations::files(&config.directory),
        ShaderSourceMode::Url => ShaderLocations::urls(&config.base_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use celestial_bodies::SourceLocation;
    use std::path::PathBuf;

    #[test]
    fn test_modes_map_to_locations() {
        let mut config = ShaderConfig::default();
        assert!(locations_for(&config).sphere_vertex.is_inline());

        config.source = ShaderSourceMode::Files;
        config.directory = PathBuf::from("assets");
        assert_eq!(
            locations_for(&config).halo_vertex,
            SourceLocation::path(PathBuf::from("assets").join("halo_vertex.wgsl"))
        );

        config.source = ShaderSourceMode::Url;
        config.base_url = "https://example.com/star".to_string();
        assert_eq!(
            locations_for(&config).sphere_fragment,
            SourceLocation::url("https://example.com/star/sphere_fragment.wgsl")
        );
    }

    #[test]
    fn test_timeout_only_when_configured() {
        let mut config = ShaderConfig::default();
        assert_eq!(loader_for(&config).timeout(), None);
        config.load_timeout_ms = Some(250);
        assert_eq!(loader_for(&config).timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_file_mode_loads_shipped_shaders() {
        let dir = tempfile::tempdir().unwrap();
        for (name, source) in celestial_bodies::shaders::EMBEDDED_STAR_SHADERS {
            std::fs::write(dir.path().join(format!("{name}.wgsl")), source).unwrap();
        }
        let config = ShaderConfig {
            source: ShaderSourceMode::Files,
            directory: dir.path().to_path_buf(),
            ..Default::default()
        };

        let outcome = std::rc::Rc::new(std::cell::RefCell::new(None));
        let slot = std::rc::Rc::clone(&outcome);
        let mut batch = loader_for(&config).load(
            locations_for(&config).into_requests(),
            move |result| *slot.borrow_mut() = Some(result),
        );
        batch.wait();

        let sources = outcome.borrow_mut().take().unwrap().unwrap();
        assert_eq!(sources.len(), 4);
    }
}
