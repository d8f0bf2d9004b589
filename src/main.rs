//! Progressive CPU path tracer. A single background worker traces a scene of
//! spheres into a shared frame while the window presents whatever has been
//! rendered so far.

use anyhow::Context;
use clap::Parser;
use log::{error, info, LevelFilter};
use winit::dpi::PhysicalSize;
use winit::event::{Event, MouseScrollDelta, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

use crate::cli::Args;
use crate::gpu::{Gpu, Renderer};
use crate::session::RenderSession;

mod aabb;
mod bvh;
mod camera;
mod cli;
mod gpu;
mod material;
mod object;
mod picture;
mod ray;
mod render;
mod scene;
mod session;

const LOOK_SENSITIVITY: f32 = 0.005;
/// Pixels one wheel notch counts as.
const LINE_HEIGHT: f32 = 20.0;

fn init_logger(level: LevelFilter) {
    env_logger::builder()
        .target(env_logger::Target::Stdout)
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.clone().into());

    let event_loop = EventLoop::new();

    let window = WindowBuilder::new()
        .with_title("CPU Ray-Tracing")
        .with_inner_size(PhysicalSize::new(args.width, args.height))
        .build(&event_loop)
        .context("creating window")?;

    let mut renderer = smol::block_on(async {
        let gpu = Gpu::new().await?;
        let surface = gpu.surface(&window)?;
        anyhow::Ok(Renderer::new(gpu, surface))
    }).context("initializing graphics")?;

    let size = window.inner_size();
    renderer.surface_resize((size.width, size.height)).context("configuring surface")?;

    let settings = args.render_settings();
    info!(target: "app", "Rendering {:?} scene, seed {}", settings.scene, settings.seed);
    let mut session = RenderSession::new(settings);
    session.resize(size.width, size.height);
    let frame = session.frame();

    event_loop.run(move |event, _, control_flow| {
        control_flow.set_poll();

        match event {
            Event::RedrawRequested(window_id) if window.id() == window_id => {
                if let Err(err) = renderer.render(&frame) {
                    error!(target: "app", "Presentation failed: {}", err);
                    control_flow.set_exit();
                }
            }
            Event::RedrawEventsCleared => {
                window.request_redraw();
            }
            Event::WindowEvent { event, window_id } if window.id() == window_id => match event {
                WindowEvent::Resized(size) => {
                    if let Err(err) = renderer.surface_resize((size.width, size.height)) {
                        error!(target: "app", "Surface resize failed: {}", err);
                        control_flow.set_exit();
                        return;
                    }
                    session.resize(size.width, size.height);
                }
                WindowEvent::CloseRequested => control_flow.set_exit(),
                WindowEvent::MouseWheel { delta, .. } => {
                    let (x, y) = match delta {
                        MouseScrollDelta::LineDelta(x, y) => (x * LINE_HEIGHT, y * LINE_HEIGHT),
                        MouseScrollDelta::PixelDelta(position) => (position.x as f32, position.y as f32),
                    };
                    session.orbit(x * LOOK_SENSITIVITY, y * LOOK_SENSITIVITY);
                }
                _ => {}
            }
            Event::LoopDestroyed => {
                info!(target: "app", "Shutting down");
                session.shutdown();
            }
            _ => {}
        }
    });
}
