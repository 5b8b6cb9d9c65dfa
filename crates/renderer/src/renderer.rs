//! The frame orchestrator.
//!
//! [`Renderer`] owns the whole GPU-side resource graph (instance, surface,
//! device, command pool, shaders, pipeline layout, mesh, presentation
//! chain, per-image command buffers, and the pipeline) and drives the
//! per-tick sequence:
//!
//! ```text
//! acquire image -> record commands -> submit -> present
//!                     |                              |
//!                     +-- OutOfDate ----------------->  rebuild chain
//!                         Suboptimal / resize signal
//! ```
//!
//! The chain and the pipeline are the only resources replaced at runtime:
//! the chain whenever the surface invalidates it, the pipeline along with
//! it because a pipeline is compiled against one specific render pass.
//!
//! # Resource Destruction Order
//!
//! Fields are declared in destruction order; after the drop handler waits
//! for device idle and returns the command buffers, the pipeline and chain
//! go first, then the device-derived resources, then the device itself,
//! the surface, and finally the instance.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use trigon_platform::{Surface, Window};
use trigon_rhi::command::{CommandBuffer, CommandPool};
use trigon_rhi::device::Device;
use trigon_rhi::instance::Instance;
use trigon_rhi::physical_device::select_physical_device;
use trigon_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use trigon_rhi::render_pass::RenderPass;
use trigon_rhi::shader::{Shader, ShaderStage};
use trigon_rhi::swapchain::{ImageAcquire, Swapchain, SwapchainStatus};
use trigon_rhi::vertex::Vertex;
use trigon_rhi::{RhiError, RhiResult, vk};

use crate::mesh::Mesh;
use crate::push::{PushConstants, stacked_draws};

/// Background clear color.
const CLEAR_COLOR: [f32; 4] = [0.01, 0.01, 0.01, 1.0];

/// Caller-supplied renderer configuration.
///
/// Shader binaries are opaque inputs; the paths come from the application,
/// never from constants baked into the renderer.
pub struct RendererConfig {
    /// Path to the compiled vertex shader (SPIR-V).
    pub vertex_shader: PathBuf,
    /// Path to the compiled fragment shader (SPIR-V).
    pub fragment_shader: PathBuf,
}

/// Owns all rendering resources and draws one frame per tick.
pub struct Renderer {
    // Replaced at runtime; `None` only after a failed rebuild, which is
    // fatal to the run loop anyway.
    pipeline: Option<Pipeline>,
    swapchain: Option<Swapchain>,
    /// One command buffer per presentable image, re-recorded every frame.
    command_buffers: Vec<vk::CommandBuffer>,

    // Stable for the renderer's lifetime, in destruction order.
    mesh: Mesh,
    vertex_shader: Shader,
    fragment_shader: Shader,
    pipeline_layout: PipelineLayout,
    command_pool: CommandPool,
    device: Arc<Device>,
    surface: Surface,
    instance: Instance,

    /// Set when a rebuild was requested while the window had a zero
    /// extent; the rebuild completes on the first tick with a drawable
    /// extent.
    rebuild_pending: bool,
}

impl Renderer {
    /// Creates a renderer for the given window and vertex list.
    ///
    /// # Errors
    ///
    /// Any resource-creation failure is returned and should terminate the
    /// application; partially created resources are released through their
    /// own drop handlers.
    pub fn new(window: &Window, vertices: &[Vertex], config: &RendererConfig) -> RhiResult<Self> {
        let extent = window.extent();
        info!("Initializing renderer ({}x{})", extent.width, extent.height);

        let instance = Instance::new(cfg!(debug_assertions))?;

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::Surface(e.to_string()))?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;

        let device = Device::new(&instance, &physical_device_info)?;

        let command_pool = CommandPool::new(device.clone(), device.graphics_family_index())?;

        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            &config.vertex_shader,
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            &config.fragment_shader,
            ShaderStage::Fragment,
            "main",
        )?;

        let push_range = vk::PushConstantRange {
            stage_flags: PushConstants::stages(),
            offset: 0,
            size: PushConstants::SIZE,
        };
        let pipeline_layout = PipelineLayout::new(device.clone(), &[], &[push_range])?;

        let mesh = Mesh::new(device.clone(), vertices)?;

        let swapchain = Swapchain::new(&instance, device.clone(), surface.handle(), extent)?;

        let command_buffers =
            command_pool.allocate_command_buffers(swapchain.image_count() as u32)?;

        let pipeline = build_pipeline(
            &device,
            &vertex_shader,
            &fragment_shader,
            &pipeline_layout,
            swapchain.render_pass(),
        )?;

        info!(
            "Renderer initialized: {} swapchain images, {} vertices",
            swapchain.image_count(),
            mesh.vertex_count()
        );

        Ok(Self {
            pipeline: Some(pipeline),
            swapchain: Some(swapchain),
            command_buffers,
            mesh,
            vertex_shader,
            fragment_shader,
            pipeline_layout,
            command_pool,
            device,
            surface,
            instance,
            rebuild_pending: false,
        })
    }

    /// Draws one frame.
    ///
    /// A zero-extent window (minimized) records nothing; the event loop
    /// keeps polling and the next tick with a drawable extent resumes,
    /// completing any deferred chain rebuild first. `OutOfDate` at acquire
    /// and `OutOfDate`/`Suboptimal` at present trigger a rebuild, as does
    /// the window's resize signal, which is consumed exactly once per
    /// rebuild decision.
    ///
    /// # Errors
    ///
    /// Everything except the recoverable chain invalidations is returned
    /// and should terminate the run loop.
    pub fn draw_frame(&mut self, window: &mut Window) -> RhiResult<()> {
        let extent = window.extent();
        if extent.width == 0 || extent.height == 0 {
            return Ok(());
        }

        if self.rebuild_pending {
            self.rebuild_swapchain(extent)?;
        }

        let acquired = self.chain()?.acquire_next_image()?;
        let image_index = match acquired {
            ImageAcquire::Ready { image_index, .. } => image_index,
            ImageAcquire::OutOfDate => {
                self.rebuild_swapchain(extent)?;
                return Ok(());
            }
        };

        self.record_commands(image_index)?;

        let command_buffer = self.command_buffers[image_index as usize];
        let chain = self.chain_mut()?;
        chain.submit(command_buffer, image_index)?;
        let status = chain.present(image_index)?;

        if status != SwapchainStatus::Optimal || window.resize_signaled() {
            window.reset_resize_signal();
            self.rebuild_swapchain(window.extent())?;
        }

        Ok(())
    }

    /// Replaces the presentation chain and everything bound to it.
    ///
    /// A zero extent defers the rebuild until the window is drawable
    /// again. Otherwise: full device-idle barrier, recycle the chain from
    /// its predecessor, reallocate the command buffers if the image count
    /// changed, and rebuild the pipeline against the new render pass.
    fn rebuild_swapchain(&mut self, extent: vk::Extent2D) -> RhiResult<()> {
        if extent.width == 0 || extent.height == 0 {
            debug!("Deferring chain rebuild while the window has no drawable extent");
            self.rebuild_pending = true;
            return Ok(());
        }
        self.rebuild_pending = false;

        // Stop-the-world: no submission may be in flight while the chain
        // and its dependents are replaced
        self.device.wait_idle()?;

        let previous = self.swapchain.take().ok_or_else(chain_lost)?;
        let chain = Swapchain::recycle(
            &self.instance,
            self.device.clone(),
            self.surface.handle(),
            extent,
            previous,
        )?;

        if chain.image_count() != self.command_buffers.len() {
            debug!(
                "Image count changed ({} -> {}), reallocating command buffers",
                self.command_buffers.len(),
                chain.image_count()
            );
            self.command_pool.free_command_buffers(&self.command_buffers);
            self.command_buffers = self
                .command_pool
                .allocate_command_buffers(chain.image_count() as u32)?;
        }

        // A pipeline is compiled against one pass description; rebuild it
        // unconditionally rather than proving the new pass compatible
        self.pipeline = None;
        self.pipeline = Some(build_pipeline(
            &self.device,
            &self.vertex_shader,
            &self.fragment_shader,
            &self.pipeline_layout,
            chain.render_pass(),
        )?);

        info!(
            "Presentation chain rebuilt: {}x{}, {} images",
            chain.extent().width,
            chain.extent().height,
            chain.image_count()
        );

        self.swapchain = Some(chain);
        Ok(())
    }

    /// Records the command buffer for the acquired image: one render pass,
    /// dynamic viewport/scissor at the chain extent, and the four
    /// push-constant draws of the demo payload.
    fn record_commands(&self, image_index: u32) -> RhiResult<()> {
        let chain = self.chain()?;
        let pipeline = self.pipeline.as_ref().ok_or_else(chain_lost)?;

        let cmd = CommandBuffer::from_handle(
            self.device.clone(),
            self.command_buffers[image_index as usize],
        );

        cmd.begin()?;

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: CLEAR_COLOR,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let extent = chain.extent();
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(chain.render_pass().handle())
            .framebuffer(chain.framebuffer(image_index as usize))
            .render_area(render_area)
            .clear_values(&clear_values);

        cmd.begin_render_pass(&begin_info);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        cmd.set_viewport(&viewport);
        cmd.set_scissor(&render_area);

        pipeline.bind(&cmd);
        self.mesh.bind(&cmd);

        for push in stacked_draws() {
            cmd.push_constants(
                self.pipeline_layout.handle(),
                PushConstants::stages(),
                0,
                &push,
            );
            self.mesh.draw(&cmd);
        }

        cmd.end_render_pass();
        cmd.end()?;

        Ok(())
    }

    fn chain(&self) -> RhiResult<&Swapchain> {
        self.swapchain.as_ref().ok_or_else(chain_lost)
    }

    fn chain_mut(&mut self) -> RhiResult<&mut Swapchain> {
        self.swapchain.as_mut().ok_or_else(chain_lost)
    }
}

/// Builds the graphics pipeline against a render pass, with the fixed
/// state the demo uses: triangle list, no culling, depth test, dynamic
/// viewport/scissor.
fn build_pipeline(
    device: &Arc<Device>,
    vertex_shader: &Shader,
    fragment_shader: &Shader,
    layout: &PipelineLayout,
    render_pass: &RenderPass,
) -> RhiResult<Pipeline> {
    GraphicsPipelineBuilder::new()
        .vertex_shader(vertex_shader)
        .fragment_shader(fragment_shader)
        .vertex_binding(Vertex::binding_description())
        .vertex_attributes(&Vertex::attribute_descriptions())
        .render_pass(render_pass, 0)
        .build(device.clone(), layout)
}

/// The chain is absent only after a failed rebuild already reported its
/// own fatal error.
fn chain_lost() -> RhiError {
    RhiError::Swapchain("presentation chain was lost by a failed rebuild".to_string())
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Final barrier: let any in-flight submission finish before the
        // field drops below release the resources it uses
        if let Err(e) = self.device.wait_idle() {
            tracing::error!("Failed to wait for device idle during teardown: {:?}", e);
        }

        self.command_pool.free_command_buffers(&self.command_buffers);
        self.command_buffers.clear();

        info!("Renderer destroyed");
    }
}
