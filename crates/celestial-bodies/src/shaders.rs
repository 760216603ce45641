//! The four star shader sources: their logical names, where to find them,
//! and the validated set handed to [`StarBody::build`](crate::StarBody::build).

use std::path::Path;

use crate::loader::{LoadError, SourceLocation, SourceMap, SourceRequests};

pub const SPHERE_VERTEX: &str = "sphere_vertex";
pub const SPHERE_FRAGMENT: &str = "sphere_fragment";
pub const HALO_VERTEX: &str = "halo_vertex";
pub const HALO_FRAGMENT: &str = "halo_fragment";

/// Logical names of the star shaders, in build order.
pub const STAR_SHADER_NAMES: [&str; 4] = [SPHERE_VERTEX, SPHERE_FRAGMENT, HALO_VERTEX, HALO_FRAGMENT];

pub const SPHERE_VERTEX_SOURCE: &str = include_str!("../shaders/sphere_vertex.wgsl");
pub const SPHERE_FRAGMENT_SOURCE: &str = include_str!("../shaders/sphere_fragment.wgsl");
pub const HALO_VERTEX_SOURCE: &str = include_str!("../shaders/halo_vertex.wgsl");
pub const HALO_FRAGMENT_SOURCE: &str = include_str!("../shaders/halo_fragment.wgsl");

/// The shipped sources, compiled into the binary.
pub const EMBEDDED_STAR_SHADERS: [(&str, &str); 4] = [
    (SPHERE_VERTEX, SPHERE_VERTEX_SOURCE),
    (SPHERE_FRAGMENT, SPHERE_FRAGMENT_SOURCE),
    (HALO_VERTEX, HALO_VERTEX_SOURCE),
    (HALO_FRAGMENT, HALO_FRAGMENT_SOURCE),
];

/// File extension of the shipped shader files.
pub const SHADER_EXTENSION: &str = "wgsl";

/// Where each of the four star shaders should be fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderLocations {
    pub sphere_vertex: SourceLocation,
    pub sphere_fragment: SourceLocation,
    pub halo_vertex: SourceLocation,
    pub halo_fragment: SourceLocation,
}

impl ShaderLocations {
    /// `<dir>/<name>.wgsl` for each shader.
    pub fn files(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::from_fn(|name| SourceLocation::path(dir.join(format!("{name}.{SHADER_EXTENSION}"))))
    }

    /// `<base_url>/<name>.wgsl` for each shader.
    pub fn urls(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self::from_fn(|name| SourceLocation::url(format!("{base}/{name}.{SHADER_EXTENSION}")))
    }

    /// The embedded sources, addressed by logical name.
    pub fn inline() -> Self {
        Self::from_fn(|name| SourceLocation::inline(name))
    }

    fn from_fn(mut location: impl FnMut(&str) -> SourceLocation) -> Self {
        Self {
            sphere_vertex: location(SPHERE_VERTEX),
            sphere_fragment: location(SPHERE_FRAGMENT),
            halo_vertex: location(HALO_VERTEX),
            halo_fragment: location(HALO_FRAGMENT),
        }
    }

    pub fn into_requests(self) -> SourceRequests {
        [
            (SPHERE_VERTEX, self.sphere_vertex),
            (SPHERE_FRAGMENT, self.sphere_fragment),
            (HALO_VERTEX, self.halo_vertex),
            (HALO_FRAGMENT, self.halo_fragment),
        ]
        .into_iter()
        .map(|(name, location)| (name.to_string(), location))
        .collect()
    }
}

/// The resolved text of the four star shaders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSourceSet {
    pub sphere_vertex: String,
    pub sphere_fragment: String,
    pub halo_vertex: String,
    pub halo_fragment: String,
}

impl ShaderSourceSet {
    /// Take the four star shaders out of a loader result. Extra entries are
    /// ignored.
    pub fn from_sources(mut sources: SourceMap) -> Result<Self, LoadError> {
        let mut take = |name: &str| {
            sources.remove(name).ok_or_else(|| LoadError::MissingSource {
                name: name.to_string(),
            })
        };
        Ok(Self {
            sphere_vertex: take(SPHERE_VERTEX)?,
            sphere_fragment: take(SPHERE_FRAGMENT)?,
            halo_vertex: take(HALO_VERTEX)?,
            halo_fragment: take(HALO_FRAGMENT)?,
        })
    }

    /// The sources compiled into this crate.
    pub fn embedded() -> Self {
        Self {
            sphere_vertex: SPHERE_VERTEX_SOURCE.to_string(),
            sphere_fragment: SPHERE_FRAGMENT_SOURCE.to_string(),
            halo_vertex: HALO_VERTEX_SOURCE.to_string(),
            halo_fragment: HALO_FRAGMENT_SOURCE.to_string(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            SPHERE_VERTEX => Some(&self.sphere_vertex),
            SPHERE_FRAGMENT => Some(&self.sphere_fragment),
            HALO_VERTEX => Some(&self.halo_vertex),
            HALO_FRAGMENT => Some(&self.halo_fragment),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        STAR_SHADER_NAMES.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_locations_use_wgsl_names() {
        let locations = ShaderLocations::files("assets/star");
        assert_eq!(
            locations.halo_fragment,
            SourceLocation::path(Path::new("assets/star").join("halo_fragment.wgsl"))
        );
    }

    #[test]
    fn test_url_locations_strip_trailing_slash() {
        let locations = ShaderLocations::urls("https://cdn.example.com/shaders/");
        assert_eq!(
            locations.sphere_vertex,
            SourceLocation::url("https://cdn.example.com/shaders/sphere_vertex.wgsl")
        );
    }

    #[test]
    fn test_requests_cover_all_four_names() {
        let requests = ShaderLocations::inline().into_requests();
        assert_eq!(requests.len(), 4);
        for name in STAR_SHADER_NAMES {
            assert_eq!(requests[name], SourceLocation::inline(name));
        }
    }

    #[test]
    fn test_from_sources_requires_every_name() {
        let mut sources: SourceMap = STAR_SHADER_NAMES
            .iter()
            .map(|n| (n.to_string(), format!("// {n}")))
            .collect();
        sources.insert("extra".into(), "// ignored".into());

        let set = ShaderSourceSet::from_sources(sources.clone()).unwrap();
        assert_eq!(set.get(HALO_VERTEX), Some("// halo_vertex"));
        assert_eq!(set.len(), 4);

        sources.remove(SPHERE_FRAGMENT);
        assert!(matches!(
            ShaderSourceSet::from_sources(sources),
            Err(LoadError::MissingSource { name }) if name == SPHERE_FRAGMENT
        ));
    }

    #[test]
    fn test_embedded_sources_declare_entry_points() {
        let set = ShaderSourceSet::embedded();
        assert!(set.sphere_vertex.contains("fn vs_main"));
        assert!(set.halo_vertex.contains("fn vs_main"));
        assert!(set.sphere_fragment.contains("fn fs_main"));
        assert!(set.halo_fragment.contains("fn fs_main"));
    }
}
