//! Star and planet visuals: procedurally shaded stars with a camera-facing
//! halo, textured planets, and the live parameter set that drives the star
//! shaders.
//!
//! Everything here is backend-neutral. A [`StarBody`] produces a [`Group`] of
//! plain meshes and materials; a rendering backend uploads and draws them.

pub mod color;
pub mod debug;
pub mod geometry;
pub mod loader;
pub mod params;
pub mod planet;
pub mod scene;
pub mod shaders;
pub mod star;

pub use color::{ColorError, ColorProfile, Rgb};
pub use debug::{STAR_SLIDERS, SliderSpec, star_slider};
pub use geometry::Geometry;
pub use loader::{
    FileProvider, HttpProvider, InlineProvider, LoadBatch, LoadError, RoutingProvider,
    ShaderSourceLoader, SourceLocation, SourceMap, SourceProvider, SourceRequests,
};
pub use params::{ParameterError, ParameterKind, ParameterName, ParameterSet, ParameterValue};
pub use planet::TexturePlanet;
pub use scene::{Group, Material, Mesh, PhongMaterial, ShaderMaterial, TextureSource, Transform};
pub use shaders::{ShaderLocations, ShaderSourceSet};
pub use star::{HALO_PART, SPHERE_PART, StarBody, StarError, StarState};
