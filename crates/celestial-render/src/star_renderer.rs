//! Draws the shader-driven parts of a star group.
//!
//! Every part gets its own pipeline and transform uniforms. Parts whose
//! materials are bound to the same [`ParameterSet`] share one star uniform
//! buffer, refreshed from the set once per frame in [`StarRenderer::update`].

use std::rc::Rc;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use thiserror::Error;
use wgpu::util::DeviceExt;

use celestial_bodies::{Group, Mesh, ParameterSet, ShaderMaterial};

use crate::shader::{FRAGMENT_ENTRY_POINT, ShaderError, ShaderLibrary, VERTEX_ENTRY_POINT};
use crate::uniforms::{StarUniforms, StarVertex, TransformUniforms};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("object '{name}' has no shader parts to draw")]
    EmptyObject { name: String },

    #[error(transparent)]
    Shader(#[from] ShaderError),
}

struct StarBinding {
    parameters: Rc<ParameterSet>,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct GpuPart {
    name: String,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    binding: usize,
    transparent: bool,
}

/// GPU resources for one star group.
pub struct StarRenderer {
    shaders: ShaderLibrary,
    bindings: Vec<StarBinding>,
    parts: Vec<GpuPart>,
}

impl StarRenderer {
    /// Upload every shader part of `object`. Parts with other materials are
    /// skipped.
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        object: &Group,
    ) -> Result<Self, RenderError> {
        // Group 0: per-part transforms
        let transform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("star-transform-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<TransformUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        // Group 1: shared star parameters
        let star_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("star-uniform-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<StarUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("star-pipeline-layout"),
            bind_group_layouts: &[&transform_bgl, &star_bgl],
            immediate_size: 0,
        });

        let mut shaders = ShaderLibrary::new();
        let mut bindings: Vec<StarBinding> = Vec::new();
        let mut parts = Vec::new();

        for mesh in object.children() {
            let Some(material) = mesh.material.as_shader() else {
                log::debug!("Skipping part '{}': not shader-driven", mesh.name);
                continue;
            };

            let binding = match bindings
                .iter()
                .position(|b| Rc::ptr_eq(&b.parameters, material.parameters()))
            {
                Some(index) => index,
                None => {
                    bindings.push(create_binding(device, &star_bgl, material.parameters()));
                    bindings.len() - 1
                }
            };

            let vertex_module = shaders.load_from_source(
                device,
                &format!("{}-vertex", mesh.name),
                &material.vertex_source,
                VERTEX_ENTRY_POINT,
            )?;
            let fragment_module = shaders.load_from_source(
                device,
                &format!("{}-fragment", mesh.name),
                &material.fragment_source,
                FRAGMENT_ENTRY_POINT,
            )?;

            let pipeline = create_pipeline(
                device,
                &pipeline_layout,
                &PartShaders {
                    name: &mesh.name,
                    vertex: vertex_module,
                    fragment: fragment_module,
                },
                color_format,
                material,
            );

            parts.push(upload_part(device, &transform_bgl, mesh, pipeline, binding, material));
        }

        if parts.is_empty() {
            return Err(RenderError::EmptyObject {
                name: object.name.clone(),
            });
        }

        // Opaque parts first; blended parts read what is behind them.
        parts.sort_by_key(|part| part.transparent);

        log::info!(
            "Star renderer initialized: {} part(s), {} parameter binding(s)",
            parts.len(),
            bindings.len()
        );

        Ok(Self {
            shaders,
            bindings,
            parts,
        })
    }

    /// Refresh the star uniforms from their parameter sets and the per-part
    /// transforms from `object`. Call once per frame before [`render`](Self::render).
    pub fn update(
        &self,
        queue: &wgpu::Queue,
        view_proj: Mat4,
        camera_position: Vec3,
        object: &Group,
    ) {
        for binding in &self.bindings {
            let uniforms = StarUniforms::from_parameters(&binding.parameters);
            queue.write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&uniforms));
        }

        for part in &self.parts {
            let Some(mesh) = object.child(&part.name) else {
                continue;
            };
            let uniforms =
                TransformUniforms::new(view_proj, object.child_world_matrix(mesh), camera_position);
            queue.write_buffer(&part.transform_buffer, 0, bytemuck::bytes_of(&uniforms));
        }
    }

    /// Draw opaque parts, then transparent ones.
    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        for part in &self.parts {
            pass.set_pipeline(&part.pipeline);
            pass.set_bind_group(0, &part.transform_bind_group, &[]);
            pass.set_bind_group(1, &self.bindings[part.binding].bind_group, &[]);
            pass.set_vertex_buffer(0, part.vertex_buffer.slice(..));
            pass.set_index_buffer(part.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..part.index_count, 0, 0..1);
        }
    }

    /// Part names in draw order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|part| part.name.as_str())
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Number of distinct parameter sets uploaded.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }
}

struct PartShaders<'a> {
    name: &'a str,
    vertex: Arc<wgpu::ShaderModule>,
    fragment: Arc<wgpu::ShaderModule>,
}

fn create_binding(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    parameters: &Rc<ParameterSet>,
) -> StarBinding {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("star-uniforms"),
        contents: bytemuck::bytes_of(&StarUniforms::from_parameters(parameters)),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("star-uniform-bg"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });

    StarBinding {
        parameters: Rc::clone(parameters),
        buffer,
        bind_group,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shaders: &PartShaders<'_>,
    color_format: wgpu::TextureFormat,
    material: &ShaderMaterial,
) -> wgpu::RenderPipeline {
    let label = format!("star-{}-pipeline", shaders.name);
    let (blend, cull_mode) = if material.transparent {
        // The halo must stay visible from behind.
        (wgpu::BlendState::ALPHA_BLENDING, None)
    } else {
        (wgpu::BlendState::REPLACE, Some(wgpu::Face::Back))
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label.as_str()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shaders.vertex,
            entry_point: Some(VERTEX_ENTRY_POINT),
            buffers: &[StarVertex::LAYOUT],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shaders.fragment,
            entry_point: Some(FRAGMENT_ENTRY_POINT),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

fn upload_part(
    device: &wgpu::Device,
    transform_layout: &wgpu::BindGroupLayout,
    mesh: &Mesh,
    pipeline: wgpu::RenderPipeline,
    binding: usize,
    material: &ShaderMaterial,
) -> GpuPart {
    let vertices = StarVertex::from_geometry(&mesh.geometry);
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(format!("star-{}-vertices", mesh.name).as_str()),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(format!("star-{}-indices", mesh.name).as_str()),
        contents: bytemuck::cast_slice(&mesh.geometry.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(format!("star-{}-transforms", mesh.name).as_str()),
        contents: bytemuck::bytes_of(&TransformUniforms::default()),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("star-transform-bg"),
        layout: transform_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: transform_buffer.as_entire_binding(),
        }],
    });

    log::debug!(
        "Uploaded part '{}': {} vertices, {} indices",
        mesh.name,
        vertices.len(),
        mesh.geometry.indices.len()
    );

    GpuPart {
        name: mesh.name.clone(),
        pipeline,
        vertex_buffer,
        index_buffer,
        index_count: mesh.geometry.indices.len() as u32,
        transform_buffer,
        transform_bind_group,
        binding,
        transparent: material.transparent,
    }
}
