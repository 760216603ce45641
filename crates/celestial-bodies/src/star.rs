//! Procedurally shaded stars.
//!
//! A [`StarBody`] is a composite of two renderable parts sharing one live
//! [`ParameterSet`]:
//!
//! - **Sphere**: a densely tessellated sphere whose shader displaces and
//!   colours the surface from the parameter set.
//! - **Halo**: a flat, transparent quad re-oriented toward the camera every
//!   frame (a billboard) that draws the corona glow.
//!
//! Construction is cheap and synchronous. The parts only exist once shader
//! sources are available, either from [`StarBody::load`] or from sources the
//! caller already has (e.g. [`ShaderSourceSet::embedded`]).

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use glam::Vec3;
use thiserror::Error;
use tracing::{debug, info};

use celestial_config::StarConfig;

use crate::color::{ColorError, ColorProfile};
use crate::geometry::Geometry;
use crate::loader::{LoadBatch, LoadError, ShaderSourceLoader};
use crate::params::ParameterSet;
use crate::scene::{Group, Material, Mesh, ShaderMaterial};
use crate::shaders::{ShaderLocations, ShaderSourceSet};

/// Name of the sphere part inside the star's group.
pub const SPHERE_PART: &str = "Sphere";
/// Name of the halo part inside the star's group.
pub const HALO_PART: &str = "Halo";

/// Longitude and latitude segments of the sphere part.
pub const SPHERE_SEGMENTS: u32 = 100;
/// Edge length of the halo quad in world units.
pub const HALO_SIZE: f32 = 4.0;
/// Subdivisions along each edge of the halo quad.
pub const HALO_SEGMENTS: u32 = 40;

/// Lifecycle of a [`StarBody`]. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StarState {
    /// Parameters exist, no geometry.
    Constructed,
    /// Shader sources are being fetched.
    Loading,
    /// Shader sources arrived; [`StarBody::build`] has not run yet.
    ShadersReady,
    /// Sphere and halo are built. Terminal.
    Rendered,
}

#[derive(Debug, Error)]
pub enum StarError {
    #[error("star '{name}' is already built")]
    AlreadyBuilt { name: String },

    #[error(transparent)]
    Color(#[from] ColorError),
}

/// A star: a shaded sphere plus a camera-facing halo driven by one shared
/// parameter set.
#[derive(Debug)]
pub struct StarBody {
    radius: f64,
    colors: ColorProfile,
    time_multiplier: f64,
    displacement: f64,
    parameters: Rc<ParameterSet>,
    created_at: Instant,
    state: Rc<Cell<StarState>>,
    object: Group,
}

impl StarBody {
    /// Create a star with a fully populated parameter set and no parts.
    ///
    /// Inputs are not validated; degenerate values reach the shaders as given.
    pub fn new(radius: f64, colors: ColorProfile, displacement: f64, time_multiplier: f64) -> Self {
        let parameters = Rc::new(ParameterSet::new(radius, &colors, time_multiplier, displacement));
        debug!(
            "Star created: radius={}, intensity={}, displacement={}, time_multiplier={}",
            radius,
            colors.intensity(),
            displacement,
            time_multiplier
        );

        Self {
            radius,
            colors,
            time_multiplier,
            displacement,
            parameters,
            created_at: Instant::now(),
            state: Rc::new(Cell::new(StarState::Constructed)),
            object: Group::new("Star"),
        }
    }

    /// Create a star from configuration. Fails only on malformed hex colors.
    pub fn from_config(config: &StarConfig) -> Result<Self, StarError> {
        let colors = ColorProfile::from_hex(
            &config.corona_color,
            &config.core_color,
            &config.inner_border_color,
            &config.outer_border_color,
            config.intensity,
        )?;
        Ok(Self::new(
            config.radius,
            colors,
            config.displacement,
            config.time_multiplier,
        ))
    }

    /// Fetch the four star shaders from `locations`.
    ///
    /// `callback` fires once, when the returned batch is polled after every
    /// source resolved (immediately for inline locations). Geometry is not
    /// built here: call [`build`](Self::build) with the delivered set.
    pub fn load<F>(
        &mut self,
        loader: &ShaderSourceLoader,
        locations: ShaderLocations,
        callback: F,
    ) -> LoadBatch
    where
        F: FnOnce(Result<ShaderSourceSet, LoadError>) + 'static,
    {
        if self.state.get() == StarState::Constructed {
            self.state.set(StarState::Loading);
        }

        let state = Rc::clone(&self.state);
        loader.load(locations.into_requests(), move |result| {
            let result = result.and_then(ShaderSourceSet::from_sources);
            if result.is_ok() && state.get() == StarState::Loading {
                state.set(StarState::ShadersReady);
            }
            callback(result);
        })
    }

    /// Build the sphere and halo parts from `sources` and return the star's
    /// group. Both parts bind this star's parameter set by identity.
    ///
    /// A star is built once; a second call fails and leaves the parts as they
    /// are.
    pub fn build(&mut self, sources: &ShaderSourceSet) -> Result<&Group, StarError> {
        if self.state.get() == StarState::Rendered {
            return Err(StarError::AlreadyBuilt {
                name: self.object.name.clone(),
            });
        }

        // Unit sphere; sync_placement scales it by the live radius.
        let sphere = Mesh::new(
            SPHERE_PART,
            Geometry::sphere(1.0, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
            Material::Shader(ShaderMaterial::new(
                &sources.sphere_vertex,
                &sources.sphere_fragment,
                Rc::clone(&self.parameters),
            )),
        );

        let halo = Mesh::new(
            HALO_PART,
            Geometry::plane(HALO_SIZE, HALO_SIZE, HALO_SEGMENTS, HALO_SEGMENTS),
            Material::Shader(
                ShaderMaterial::new(
                    &sources.halo_vertex,
                    &sources.halo_fragment,
                    Rc::clone(&self.parameters),
                )
                .with_transparent(true),
            ),
        );

        self.object.add(sphere);
        self.object.add(halo);
        self.sync_placement();
        self.state.set(StarState::Rendered);

        info!(
            "Star built: {} parts, {} triangles",
            self.object.len(),
            self.object
                .children()
                .iter()
                .map(|m| m.geometry.triangle_count())
                .sum::<usize>()
        );

        Ok(&self.object)
    }

    /// Per-frame update: set `time` to the wall-clock milliseconds since
    /// creation, place the star from `sphere_position` and `sphere_radius`,
    /// then turn the halo toward `camera_position` (world space).
    ///
    /// Safe in every state; before the parts exist only time advances.
    pub fn update_frame(&mut self, camera_position: Vec3) {
        self.update_frame_at(camera_position, Instant::now());
    }

    /// [`update_frame`](Self::update_frame) with an explicit frame timestamp.
    pub fn update_frame_at(&mut self, camera_position: Vec3, now: Instant) {
        let elapsed = now.saturating_duration_since(self.created_at);
        self.parameters
            .advance_time_to(elapsed.as_secs_f64() * 1000.0);
        self.sync_placement();

        if self.object.len() < 2 {
            return;
        }

        let target = self.object.world_to_local(camera_position);
        if let Some(halo) = self.object.child_mut(HALO_PART) {
            halo.transform.look_at(target);
        }
    }

    /// Move the star in the world. Keeps `sphere_position` in step.
    pub fn set_position(&mut self, position: Vec3) {
        self.parameters.set_sphere_position(position);
        self.object.transform.translation = position;
    }

    /// Apply the position and radius slots to the scene nodes, so writes
    /// through the parameter set show up on the next render.
    fn sync_placement(&mut self) {
        self.object.transform.translation = self.parameters.sphere_position();
        let radius = self.parameters.sphere_radius() as f32;
        if let Some(sphere) = self.object.child_mut(SPHERE_PART) {
            sphere.transform.scale = Vec3::splat(radius);
        }
    }

    /// The live parameter set shared with the parts.
    pub fn parameters(&self) -> &Rc<ParameterSet> {
        &self.parameters
    }

    /// The composite node; empty until built.
    pub fn object(&self) -> &Group {
        &self.object
    }

    pub fn state(&self) -> StarState {
        self.state.get()
    }

    pub fn is_built(&self) -> bool {
        self.state.get() == StarState::Rendered
    }

    pub fn color_profile(&self) -> &ColorProfile {
        &self.colors
    }

    /// Radius the star was created with; the live value is `sphere_radius`.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Displacement the star was created with; the live value is in
    /// [`parameters`](Self::parameters).
    pub fn initial_displacement(&self) -> f64 {
        self.displacement
    }

    /// Time multiplier the star was created with.
    pub fn initial_time_multiplier(&self) -> f64 {
        self.time_multiplier
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
