//! trigon: draws a stack of tinted triangles into a resizable window.
//!
//! The event loop drives one renderer tick per redraw. Closing the window
//! exits with code 0; any fatal renderer error is reported on stderr and
//! exits nonzero.

use std::path::PathBuf;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use trigon_platform::Window;
use trigon_renderer::{Renderer, RendererConfig};
use trigon_rhi::vertex::Vertex;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const TITLE: &str = "trigon";

/// The demo geometry: one triangle, colored per vertex.
fn demo_triangle() -> Vec<Vertex> {
    vec![
        Vertex::new(Vec2::new(0.0, -0.5), Vec3::new(1.0, 0.0, 0.0)),
        Vertex::new(Vec2::new(0.5, 0.5), Vec3::new(0.0, 1.0, 0.0)),
        Vertex::new(Vec2::new(-0.5, 0.5), Vec3::new(0.0, 0.0, 1.0)),
    ]
}

/// Resolves the shader directory: `TRIGON_SHADER_DIR` when set, otherwise
/// `shaders/` relative to the working directory.
fn shader_config() -> RendererConfig {
    let dir = std::env::var_os("TRIGON_SHADER_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("shaders"));

    RendererConfig {
        vertex_shader: dir.join("triangle.vert.spv"),
        fragment_shader: dir.join("triangle.frag.spv"),
    }
}

struct App {
    window: Option<Window>,
    renderer: Option<Renderer>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            renderer: None,
            failure: None,
        }
    }

    /// Records a fatal error and ends the event loop; `main` re-raises it.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match Window::new(event_loop, WIDTH, HEIGHT, TITLE) {
            Ok(window) => window,
            Err(e) => {
                self.fail(
                    event_loop,
                    anyhow::Error::new(e).context("failed to create window"),
                );
                return;
            }
        };

        match Renderer::new(&window, &demo_triangle(), &shader_config()) {
            Ok(renderer) => {
                info!("Initialization complete, entering main loop");
                self.renderer = Some(renderer);
                self.window = Some(window);
            }
            Err(e) => self.fail(
                event_loop,
                anyhow::Error::new(e).context("failed to create renderer"),
            ),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(window) = self.window.as_mut() {
                    window.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let result = match (self.renderer.as_mut(), self.window.as_mut()) {
                    (Some(renderer), Some(window)) => renderer.draw_frame(window),
                    _ => Ok(()),
                };
                if let Err(e) = result {
                    self.fail(
                        event_loop,
                        anyhow::Error::new(e).context("frame rendering failed"),
                    );
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    trigon_core::init_logging();
    info!("Starting trigon");

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).context("event loop failed")?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
