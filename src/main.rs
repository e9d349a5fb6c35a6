mod cli;
mod config;
mod field;
mod framepace;
mod gpu;
mod physics;
mod render;
mod utils;

use std::sync::Arc;

use clap::Parser;
use log::{debug, info, warn};
use rand::{rngs::StdRng, SeedableRng};
use utils::Exists;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window},
};

use crate::{
    config::FieldConfig,
    field::ParticleField,
    framepace::Framepacer,
    gpu::GpuContext,
    physics::Rotation,
    render::{Instance, RenderModule},
};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Collect Arguments
    let args = cli::Args::parse();
    let config = FieldConfig::from_args(&args);
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("field seed: {seed}");

    // Setup Winit
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    // State
    let mut app_state = AppState {
        tokio_rt: tokio::runtime::Runtime::new()?,
        gpu: Exists::None,
        gfx: Exists::None,
        sim: SimState {
            field: Exists::None,
            rotation: Rotation::default(),
            instances: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        },
        framepace: Framepacer::new(),
        config,

        is_paused: false,
        framerate: args.framerate.unwrap_or(0),
        frames: 0,
    };

    event_loop.run_app(&mut app_state)?;
    Ok(())
}

struct GfxState {
    window: Arc<Window>,
    render_module: RenderModule,
}

struct SimState {
    field: Exists<ParticleField>,
    rotation: Rotation,
    instances: Vec<Instance>,
    rng: StdRng,
}

struct AppState {
    tokio_rt: tokio::runtime::Runtime,
    gpu: Exists<GpuContext>,
    gfx: Exists<GfxState>,
    sim: SimState,
    framepace: Framepacer,
    config: FieldConfig,

    is_paused: bool,
    framerate: u32,
    frames: u64,
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if !self.gfx.is_none() {
            return;
        }

        let mut attributes = Window::default_attributes().with_title("cubefield");
        attributes = match self.config.surface_size {
            Some((width, height)) => attributes
                .with_inner_size(LogicalSize::new(width, height))
                .with_resizable(false),
            None => attributes.with_inner_size(LogicalSize::new(1280, 720)),
        };

        let window = Arc::new(event_loop.create_window(attributes).unwrap());

        // A missing drawing surface disables the animation, it is not an error.
        let gpu = match self.tokio_rt.block_on(GpuContext::new(window.clone())) {
            Ok(gpu) => gpu,
            Err(err) => {
                warn!("no drawing surface, animation disabled: {err}");
                return;
            }
        };

        let field = ParticleField::generate(
            &self.config,
            gpu.config.width,
            gpu.config.height,
            &mut self.sim.rng,
        );
        if field.is_empty() {
            warn!("configuration produced an empty field, nothing will be drawn");
        }
        info!(
            "spawned {} particles on a {} unit cube shell",
            field.len(),
            self.config.half_extent * 2.0
        );

        let render_module = RenderModule::new(
            &gpu.device,
            gpu.config.format,
            gpu.config.width,
            gpu.config.height,
            &self.config,
            field.len(),
        );

        self.gfx = Exists::Some(GfxState {
            window,
            render_module,
        });
        self.sim.field = Exists::Some(field);
        self.gpu = Exists::Some(gpu);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        // Closing must stay reachable even when GPU setup failed and the
        // animation never started.
        if wants_exit(&event) {
            event_loop.exit();
            return;
        }

        if self.gfx.is_none() || self.gpu.is_none() {
            return;
        }

        match event {
            WindowEvent::Resized(new_size) => {
                if new_size.width == 0 || new_size.height == 0 {
                    return;
                }

                self.gpu.config.width = new_size.width;
                self.gpu.config.height = new_size.height;
                self.gpu.reconfigure_surface();

                self.gfx.render_module.resize(
                    &self.gpu.device,
                    &self.gpu.queue,
                    new_size.width,
                    new_size.height,
                );

                // The hero field follows the window; a fixed-size surface
                // keeps its particles.
                if self.config.surface_size.is_none() {
                    self.sim.field = Exists::Some(ParticleField::generate(
                        &self.config,
                        new_size.width,
                        new_size.height,
                        &mut self.sim.rng,
                    ));
                    info!(
                        "surface resized to {}x{}, respawned {} particles",
                        new_size.width,
                        new_size.height,
                        self.sim.field.len()
                    );
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                match (event.state, event.physical_key) {
                    (ElementState::Pressed, PhysicalKey::Code(KeyCode::Space)) => {
                        self.is_paused = !self.is_paused;
                    }
                    (ElementState::Pressed, PhysicalKey::Code(KeyCode::F11)) => {
                        if self.gfx.window.fullscreen().is_none() {
                            self.gfx
                                .window
                                .set_fullscreen(Some(Fullscreen::Borderless(None)));
                        } else {
                            self.gfx.window.set_fullscreen(None);
                        }
                    }
                    _ => (),
                };
            }

            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.gpu.is_none() || self.gfx.is_none() || self.sim.field.is_none() {
            return;
        }

        self.framepace.begin_frame();

        if !self.is_paused {
            physics::step(
                &mut self.sim.field,
                &mut self.sim.rotation,
                &self.config,
                self.gpu.config.width,
                self.gpu.config.height,
                &mut self.sim.instances,
            );
            self.gfx
                .render_module
                .write_instances(&self.gpu.queue, &self.sim.instances);
        }

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure_surface();
                return;
            }
            Err(err) => {
                warn!("skipping frame: {err}");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        // Paused keeps the last accumulated trails on screen.
        if !self.is_paused {
            self.gfx
                .render_module
                .accumulate(&mut encoder, self.sim.instances.len() as u32);
        }
        self.gfx.render_module.blit(&mut encoder, &view);

        self.gpu.queue.submit(Some(encoder.finish()));
        frame.present();

        let limit_frametime = if self.framerate == 0 {
            0.0
        } else {
            1.0 / self.framerate as f32
        };
        self.framepace.end_frame(limit_frametime);

        self.frames += 1;
        if self.frames % 600 == 0 {
            debug!("{:.1} fps", self.framepace.framerate());
        }
    }
}

/// Close request or the Escape key. Checked before any state guard so the
/// window can always be torn down, animating or not.
fn wants_exit(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::CloseRequested => true,
        WindowEvent::KeyboardInput { event, .. } => {
            event.state == ElementState::Pressed
                && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_request_exits_without_gpu_state() {
        // The exit decision must not depend on gfx/gpu being initialized;
        // a failed GPU setup leaves them empty for the window's lifetime.
        assert!(wants_exit(&WindowEvent::CloseRequested));
        assert!(!wants_exit(&WindowEvent::Focused(true)));
        assert!(!wants_exit(&WindowEvent::Destroyed));
    }
}
