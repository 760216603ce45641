//! GPU-side layouts shared with the star WGSL shaders.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use celestial_bodies::{Geometry, ParameterSet};

/// Interleaved vertex: position, normal, uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable, PartialEq)]
pub struct StarVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl StarVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<StarVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 24,
                shader_location: 2,
            },
        ],
    };

    /// Interleave a geometry's attribute arrays.
    pub fn from_geometry(geometry: &Geometry) -> Vec<StarVertex> {
        geometry
            .positions
            .iter()
            .zip(&geometry.normals)
            .zip(&geometry.uvs)
            .map(|((position, normal), uv)| StarVertex {
                position: position.to_array(),
                normal: normal.to_array(),
                uv: *uv,
            })
            .collect()
    }
}

/// Per-part camera and model matrices (group 0).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable, PartialEq)]
pub struct TransformUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// xyz = camera world position.
    pub camera_position: [f32; 4],
}

impl TransformUniforms {
    pub fn new(view_proj: Mat4, model: Mat4, camera_position: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
        }
    }
}

impl Default for TransformUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO)
    }
}

/// The star parameter set as the shaders read it (group 1).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable, PartialEq)]
pub struct StarUniforms {
    /// Color ramp stops 1-4, rgb in xyz.
    pub color_steps: [[f32; 4]; 4],
    /// xyz = sphere_position, w = sphere_radius.
    pub sphere: [f32; 4],
    pub time: f32,
    pub time_multiplier: f32,
    pub ratio_step_1: f32,
    pub ratio_step_2: f32,
    pub displacement: f32,
    /// `time * time_multiplier` wrapped to [`ANIMATION_PERIOD`].
    pub phase: f32,
    pub _padding: [f32; 2],
}

/// Wrap length for the animation phase. Keeps the f32 phase precise on long
/// runs at the cost of one discontinuity per period.
pub const ANIMATION_PERIOD: f64 = 4096.0;

impl StarUniforms {
    /// Snapshot the current slot values.
    pub fn from_parameters(parameters: &ParameterSet) -> Self {
        let color_steps = parameters.color_steps().map(|c| [c.r, c.g, c.b, 1.0]);
        Self {
            color_steps,
            sphere: parameters
                .sphere_position()
                .extend(parameters.sphere_radius() as f32)
                .to_array(),
            time: parameters.time() as f32,
            time_multiplier: parameters.time_multiplier() as f32,
            ratio_step_1: parameters.ratio_step_1() as f32,
            ratio_step_2: parameters.ratio_step_2() as f32,
            displacement: parameters.displacement() as f32,
            phase: (parameters.time() * parameters.time_multiplier()).rem_euclid(ANIMATION_PERIOD)
                as f32,
            _padding: [0.0; 2],
        }
    }
}
