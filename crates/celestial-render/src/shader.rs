//! Shader module compilation and caching.

use log::{debug, info};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

/// Vertex stage entry point every star shader must declare.
pub const VERTEX_ENTRY_POINT: &str = "vs_main";
/// Fragment stage entry point every star shader must declare.
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' has no entry point '{entry_point}'")]
    MissingEntryPoint { name: String, entry_point: String },

    #[error("shader '{name}' not found in library")]
    NotLoaded { name: String },
}

struct CachedModule {
    source: String,
    module: Arc<wgpu::ShaderModule>,
}

/// Compiled shader modules keyed by name.
///
/// Loading the same name with identical source returns the cached module;
/// different source replaces it.
#[derive(Default)]
pub struct ShaderLibrary {
    modules: HashMap<String, CachedModule>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `source` under `name`, after checking it declares
    /// `entry_point`.
    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
        entry_point: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        if let Some(cached) = self.modules.get(name)
            && cached.source == source
        {
            debug!("Shader '{}' unchanged, reusing module", name);
            return Ok(Arc::clone(&cached.module));
        }

        check_entry_point(name, source, entry_point)?;

        let module = Arc::new(device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        }));

        let replaced = self
            .modules
            .insert(
                name.to_string(),
                CachedModule {
                    source: source.to_string(),
                    module: Arc::clone(&module),
                },
            )
            .is_some();

        if replaced {
            info!("Replaced shader '{}'", name);
        } else {
            info!("Loaded shader '{}'", name);
        }

        Ok(module)
    }

    pub fn get(&self, name: &str) -> Option<Arc<wgpu::ShaderModule>> {
        self.modules.get(name).map(|cached| Arc::clone(&cached.module))
    }

    pub fn require(&self, name: &str) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        self.get(name).ok_or_else(|| ShaderError::NotLoaded {
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Reject sources that cannot satisfy the pipeline's entry point before
/// handing them to wgpu, whose validation errors are fatal.
pub fn check_entry_point(name: &str, source: &str, entry_point: &str) -> Result<(), ShaderError> {
    let declared = source.match_indices("fn ").any(|(i, _)| {
        let rest = &source[i + 3..];
        rest.trim_start()
            .strip_prefix(entry_point)
            .is_some_and(|tail| tail.trim_start().starts_with('('))
    });

    if declared {
        Ok(())
    } else {
        Err(ShaderError::MissingEntryPoint {
            name: name.to_string(),
            entry_point: entry_point.to_string(),
        })
    }
}
