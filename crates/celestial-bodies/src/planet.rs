//! Textured, bump-mapped planets.

use std::path::PathBuf;

use tracing::debug;

use crate::geometry::Geometry;
use crate::scene::{Material, Mesh, PhongMaterial, TextureSource};

pub const DEFAULT_BUMP_SCALE: f32 = 0.05;

/// CORS mode attached to textures fetched by URL.
pub const CROSS_ORIGIN_ANONYMOUS: &str = "anonymous";

/// Builds planet meshes: a sphere with a color texture and a bump map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexturePlanet {
    radius: f32,
    width_segments: u32,
    height_segments: u32,
    bump_scale: f32,
}

impl TexturePlanet {
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments,
            height_segments,
            bump_scale: DEFAULT_BUMP_SCALE,
        }
    }

    pub fn with_bump_scale(mut self, bump_scale: f32) -> Self {
        self.bump_scale = bump_scale;
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn bump_scale(&self) -> f32 {
        self.bump_scale
    }

    /// A planet textured from local image files. Without a bump map the color
    /// texture doubles as one.
    pub fn create_from_path(
        &self,
        texture: impl Into<PathBuf>,
        bump_map: Option<PathBuf>,
    ) -> Mesh {
        let texture = texture.into();
        let bump_map = bump_map.unwrap_or_else(|| texture.clone());
        debug!("Planet from {} (bump {})", texture.display(), bump_map.display());
        self.mesh(TextureSource::Path(texture), TextureSource::Path(bump_map))
    }

    /// A planet textured from remote images, requested anonymously.
    pub fn create_from_url(&self, texture_url: &str, bump_map_url: Option<&str>) -> Mesh {
        let remote = |url: &str| TextureSource::Url {
            url: url.to_string(),
            cross_origin: Some(CROSS_ORIGIN_ANONYMOUS.to_string()),
        };
        debug!("Planet from {}", texture_url);
        self.mesh(
            remote(texture_url),
            remote(bump_map_url.unwrap_or(texture_url)),
        )
    }

    fn mesh(&self, map: TextureSource, bump_map: TextureSource) -> Mesh {
        Mesh::new(
            "Planet",
            Geometry::sphere(self.radius, self.width_segments, self.height_segments),
            Material::Phong(PhongMaterial {
                map,
                bump_map,
                bump_scale: self.bump_scale,
            }),
        )
    }
}
