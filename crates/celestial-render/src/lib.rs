//! wgpu backend for celestial bodies: shader caching, uniform packing, and
//! drawing a star's sphere and halo into any color target.

pub mod camera;
pub mod gpu;
pub mod offscreen;
pub mod shader;
pub mod star_renderer;
pub mod uniforms;

pub use camera::OrbitCamera;
pub use gpu::{HeadlessContext, HeadlessContextError};
pub use offscreen::OffscreenTarget;
pub use shader::{ShaderError, ShaderLibrary};
pub use star_renderer::{RenderError, StarRenderer};
pub use uniforms::{ANIMATION_PERIOD, StarUniforms, StarVertex, TransformUniforms};
