//! Headless star demo.
//!
//! Loads the star shaders the way the configuration says, builds a star, and
//! steps a fixed number of frames with an orbiting camera. With `--gpu` each
//! frame is also drawn into an offscreen texture.
//!
//! Run with: `cargo run -p celestial-demo -- --frames 60 --gpu`

mod sourcing;

use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use celestial_bodies::{LoadError, STAR_SLIDERS, ShaderSourceSet, StarBody};
use celestial_config::{CliArgs, Config, default_config_dir};
use celestial_render::{HeadlessContext, OffscreenTarget, OrbitCamera, RenderError, StarRenderer};
use clap::Parser;
use glam::Vec3;
use tracing::{debug, error, info, warn};

/// Camera yaw advanced per frame, in radians.
const ORBIT_STEP: f32 = 0.01;

type LoadOutcome = Rc<RefCell<Option<Result<ShaderSourceSet, LoadError>>>>;

/// Offscreen drawing state for `--gpu` runs.
struct GpuFrames {
    context: HeadlessContext,
    target: OffscreenTarget,
    renderer: Option<StarRenderer>,
    drawn: u32,
}

impl GpuFrames {
    fn new(config: &Config) -> Option<Self> {
        match HeadlessContext::new_blocking() {
            Ok(context) => {
                let target = OffscreenTarget::new(
                    &context.device,
                    config.render.width,
                    config.render.height,
                    OffscreenTarget::DEFAULT_FORMAT,
                );
                Some(Self {
                    context,
                    target,
                    renderer: None,
                    drawn: 0,
                })
            }
            Err(e) => {
                warn!("GPU unavailable, continuing without drawing: {e}");
                None
            }
        }
    }

    fn draw(&mut self, star: &StarBody, camera: &OrbitCamera) -> Result<(), RenderError> {
        if self.renderer.is_none() {
            self.renderer = Some(StarRenderer::new(
                &self.context.device,
                self.target.format,
                star.object(),
            )?);
        }
        let Some(renderer) = self.renderer.as_ref() else {
            return Ok(());
        };

        renderer.update(
            &self.context.queue,
            camera.view_projection_matrix(),
            camera.position(),
            star.object(),
        );

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("star-frame"),
            });
        {
            let mut pass = self.target.begin_pass(&mut encoder);
            renderer.render(&mut pass);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        self.drawn += 1;
        Ok(())
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone().map_or_else(default_config_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to resolve config directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    if let Err(e) = celestial_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    ) {
        eprintln!("Logging already initialized: {e}");
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), String> {
    let mut star =
        StarBody::from_config(&config.star).map_err(|e| format!("Invalid star config: {e}"))?;
    star.set_position(Vec3::from_array(config.star.position));
    info!(
        "Star: radius={}, intensity={}, shaders from {:?}",
        config.star.radius, config.star.intensity, config.shaders.source
    );

    if config.debug.show_sliders {
        for slider in &STAR_SLIDERS {
            info!(
                "Slider '{}' [{} .. {}] step {} = {:?}",
                slider.label,
                slider.min,
                slider.max,
                slider.step,
                slider.read(star.parameters())
            );
        }
    }

    let loader = sourcing::loader_for(&config.shaders);
    let outcome: LoadOutcome = Rc::new(RefCell::new(None));
    let mut batch = {
        let outcome = Rc::clone(&outcome);
        star.load(&loader, sourcing::locations_for(&config.shaders), move |result| {
            *outcome.borrow_mut() = Some(result);
        })
    };

    let mut gpu = if config.render.gpu {
        GpuFrames::new(config)
    } else {
        None
    };

    let mut camera = OrbitCamera::new(
        Vec3::from_array(config.star.position),
        config.render.camera_distance,
    );
    camera.fov_y = config.render.fov_degrees.to_radians();
    camera.set_aspect_ratio(config.render.width, config.render.height);

    let interval = Duration::from_millis(config.render.frame_interval_ms);
    let start = star.created_at();

    for frame in 0..config.render.frames {
        if !star.is_built() {
            batch.poll();
            if let Some(result) = outcome.borrow_mut().take() {
                let sources = result.map_err(|e| format!("Shader load failed: {e}"))?;
                let group = star.build(&sources).map_err(|e| e.to_string())?;
                info!("Built '{}' at frame {}", group.name, frame);
            } else {
                // Fetches run in real time; give them a frame's worth.
                std::thread::sleep(interval);
            }
        }

        camera.orbit(ORBIT_STEP);
        star.update_frame_at(camera.position(), start + interval * (frame + 1));

        if star.is_built()
            && let Some(gpu) = gpu.as_mut()
        {
            gpu.draw(&star, &camera)
                .map_err(|e| format!("Render failed: {e}"))?;
        }

        debug!(
            "Frame {}: time={:.1}ms camera=({:.2}, {:.2}, {:.2})",
            frame,
            star.parameters().time(),
            camera.position().x,
            camera.position().y,
            camera.position().z
        );
    }

    if !star.is_built() {
        return Err(format!(
            "Shaders not ready after {} frame(s): {} of {} resolved",
            config.render.frames,
            batch.resolved(),
            batch.total()
        ));
    }

    info!(
        "Finished {} frame(s), star time {:.1}ms{}",
        config.render.frames,
        star.parameters().time(),
        gpu.map(|g| format!(", {} drawn offscreen", g.drawn))
            .unwrap_or_default()
    );
    Ok(())
}
