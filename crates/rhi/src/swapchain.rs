//! Swapchain ownership and the frame-presentation pipeline.
//!
//! [`Swapchain`] owns everything tied to the presentable image set:
//! - the VkSwapchainKHR and its N images and image views
//! - one depth target per image
//! - the render pass the images are drawn through
//! - one framebuffer per image
//! - the frame-in-flight synchronization ring and the per-image fence
//!   table
//!
//! and exposes the three per-frame operations:
//! [`acquire_next_image`](Swapchain::acquire_next_image),
//! [`submit`](Swapchain::submit), and [`present`](Swapchain::present).
//!
//! A chain is never mutated in place. When the surface invalidates it
//! (resize, out-of-date, suboptimal present), the caller constructs a
//! replacement with [`Swapchain::recycle`], which hands the predecessor's
//! handle to the driver as `old_swapchain` and retires the predecessor
//! only after the replacement is fully built.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;
use crate::render_pass::RenderPass;
use crate::sync::{FrameSync, MAX_FRAMES_IN_FLIGHT};

/// Timeout for fence and acquire waits, in nanoseconds.
const WAIT_TIMEOUT_NS: u64 = u64::MAX;

/// Depth formats to try, most precise first.
const DEPTH_FORMAT_CANDIDATES: &[vk::Format] = &[
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// Outcome of an image acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageAcquire {
    /// An image was acquired; `image_index` is in `[0, image_count)`.
    /// `suboptimal` reports that the chain no longer matches the surface
    /// perfectly but can still present.
    Ready { image_index: u32, suboptimal: bool },
    /// The surface changed incompatibly; no image was acquired and the
    /// chain must be rebuilt.
    OutOfDate,
}

/// Outcome of a presentation request that did not hard-fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapchainStatus {
    /// Presented; the chain still matches the surface.
    Optimal,
    /// Presented, but the chain no longer matches the surface perfectly;
    /// the caller should rebuild.
    Suboptimal,
    /// Not presented; the chain must be rebuilt.
    OutOfDate,
}

/// Surface capabilities relevant to swapchain creation.
#[derive(Debug, Clone)]
pub struct SwapchainSupport {
    /// Surface capabilities (image counts, extents, transforms).
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported format / color space combinations.
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes.
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    /// Queries surface support for a physical device.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the surface queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };
        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };
        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// Returns true if at least one format and one present mode exist.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Per-image depth attachment: image, view, and its allocation.
struct DepthTarget {
    device: Arc<Device>,
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

impl DepthTarget {
    fn new(device: Arc<Device>, format: vk::Format, extent: vk::Extent2D) -> RhiResult<Self> {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = {
            let mut allocator = match device.allocator().lock() {
                Ok(allocator) => allocator,
                Err(poisoned) => poisoned.into_inner(),
            };
            allocator.allocate(&AllocationCreateDesc {
                name: "depth target",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_image_memory(image, allocation.memory(), allocation.offset())?;
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::DEPTH)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let view = unsafe { device.handle().create_image_view(&view_info, None)? };

        Ok(Self {
            device,
            image,
            view,
            allocation: Some(allocation),
        })
    }
}

impl Drop for DepthTarget {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_image_view(self.view, None);
            self.device.handle().destroy_image(self.image, None);
        }
        if let Some(allocation) = self.allocation.take() {
            let mut allocator = match self.device.allocator().lock() {
                Ok(allocator) => allocator,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free depth target allocation: {:?}", e);
            }
        }
    }
}

/// The presentation chain.
///
/// Exclusively owns its images, depth targets, render pass, framebuffers,
/// and synchronization ring. The fence ring has [`MAX_FRAMES_IN_FLIGHT`]
/// slots and cycles independently of the image count; the per-image fence
/// table keeps a frame from rendering into an image a previous frame still
/// occupies.
///
/// # Thread Safety
///
/// Not thread-safe; one thread drives acquire/submit/present.
pub struct Swapchain {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Swapchain extension loader.
    loader: ash::khr::swapchain::Device,
    /// Swapchain handle.
    swapchain: vk::SwapchainKHR,
    /// Presentable images (owned by the swapchain itself).
    images: Vec<vk::Image>,
    /// Views over the presentable images.
    image_views: Vec<vk::ImageView>,
    /// Per-image depth attachments.
    depth_targets: Vec<DepthTarget>,
    /// The pass the images are rendered through.
    render_pass: RenderPass,
    /// One framebuffer per image, referencing color + depth.
    framebuffers: Vec<vk::Framebuffer>,
    /// Frame-in-flight ring, `MAX_FRAMES_IN_FLIGHT` slots.
    frame_syncs: Vec<FrameSync>,
    /// Fence of the submission currently targeting each image, or null.
    images_in_flight: Vec<vk::Fence>,
    /// Ring cursor, advanced at present.
    current_frame: usize,
    /// Color format the chain was negotiated with.
    color_format: vk::Format,
    /// Image extent.
    extent: vk::Extent2D,
    /// Present mode in use.
    present_mode: vk::PresentModeKHR,
}

impl Swapchain {
    /// Builds a fresh chain sized to `extent`.
    ///
    /// Negotiates format, present mode, extent, and image count against
    /// the surface, then builds image views, depth targets, the render
    /// pass, framebuffers, and the sync ring.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Swapchain`] for inadequate surface support and
    /// propagates any rejected resource creation.
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        Self::create(instance, device, surface, extent, vk::SwapchainKHR::null())
    }

    /// Builds a replacement chain, recycling `previous`.
    ///
    /// The predecessor's handle is passed to the driver as `old_swapchain`
    /// so in-flight presentations can finish, and the predecessor's
    /// resources are released only after the replacement exists
    /// (build-then-retire).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Swapchain::new`]. On error the predecessor
    /// is still released; the caller treats the failure as fatal.
    pub fn recycle(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        extent: vk::Extent2D,
        previous: Swapchain,
    ) -> RhiResult<Self> {
        let chain = Self::create(instance, device, surface, extent, previous.swapchain)?;

        if !chain.is_compatible_with(&previous) {
            debug!(
                "Replacement chain renegotiated formats (color {:?} -> {:?})",
                previous.color_format,
                chain.color_format()
            );
        }

        // Retire the predecessor only now that the replacement is complete
        drop(previous);

        Ok(chain)
    }

    fn create(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        extent: vk::Extent2D,
        old_swapchain: vk::SwapchainKHR,
    ) -> RhiResult<Self> {
        let loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());

        let support = SwapchainSupport::query(device.physical_device(), surface, &surface_loader)?;
        if !support.is_adequate() {
            return Err(RhiError::Swapchain(
                "surface reports no formats or present modes".to_string(),
            ));
        }

        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(&support.capabilities, extent);
        let image_count = choose_image_count(&support.capabilities);

        info!(
            "Creating swapchain: {}x{}, {:?}, {:?}, {} images",
            extent.width, extent.height, surface_format.format, present_mode, image_count
        );

        let graphics_family = device.graphics_family_index();
        let present_family = device.present_family_index();

        let family_indices = [graphics_family, present_family];
        let (sharing_mode, family_indices_slice) = if graphics_family != present_family {
            (vk::SharingMode::CONCURRENT, family_indices.as_slice())
        } else {
            (vk::SharingMode::EXCLUSIVE, &[][..])
        };

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(family_indices_slice)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { loader.create_swapchain(&create_info, None)? };

        let images = unsafe { loader.get_swapchain_images(swapchain)? };
        info!("Swapchain created with {} images", images.len());

        let image_views = create_image_views(&device, &images, surface_format.format)?;

        let depth_format = find_depth_format(instance.handle(), device.physical_device())?;
        let depth_targets = images
            .iter()
            .map(|_| DepthTarget::new(device.clone(), depth_format, extent))
            .collect::<RhiResult<Vec<_>>>()?;

        let render_pass = RenderPass::new(device.clone(), surface_format.format, depth_format)?;

        let framebuffers =
            create_framebuffers(&device, &render_pass, &image_views, &depth_targets, extent)?;

        let frame_syncs = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| FrameSync::new(device.clone()))
            .collect::<RhiResult<Vec<_>>>()?;

        let images_in_flight = vec![vk::Fence::null(); images.len()];

        Ok(Self {
            device,
            loader,
            swapchain,
            images,
            image_views,
            depth_targets,
            render_pass,
            framebuffers,
            frame_syncs,
            images_in_flight,
            current_frame: 0,
            color_format: surface_format.format,
            extent,
            present_mode,
        })
    }

    /// Acquires the next presentable image.
    ///
    /// Blocks on the current ring slot's fence first, which bounds
    /// outstanding submissions to [`MAX_FRAMES_IN_FLIGHT`]: the slot cannot
    /// be reused before its previous submission completed. The acquired
    /// image signals the slot's image-available semaphore.
    ///
    /// # Errors
    ///
    /// Out-of-date surfaces are reported through [`ImageAcquire::OutOfDate`],
    /// not as errors; everything else is fatal.
    pub fn acquire_next_image(&self) -> RhiResult<ImageAcquire> {
        let sync = &self.frame_syncs[self.current_frame];
        sync.in_flight().wait(WAIT_TIMEOUT_NS)?;

        let result = unsafe {
            self.loader.acquire_next_image(
                self.swapchain,
                WAIT_TIMEOUT_NS,
                sync.image_available().handle(),
                vk::Fence::null(),
            )
        };

        match result {
            Ok((image_index, suboptimal)) => Ok(ImageAcquire::Ready {
                image_index,
                suboptimal,
            }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during acquire");
                Ok(ImageAcquire::OutOfDate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Submits a recorded command buffer for the acquired image.
    ///
    /// Execution waits on the slot's image-available semaphore at the
    /// color-attachment stage, signals the slot's render-finished semaphore,
    /// and arms the slot's fence for the next reuse of the slot. If a prior
    /// frame still targets the same image (possible when the image count
    /// differs from the ring size), its fence is waited on first.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence operations or the queue submission
    /// fail; all are fatal.
    pub fn submit(&mut self, command_buffer: vk::CommandBuffer, image_index: u32) -> RhiResult<()> {
        let image = image_index as usize;

        if self.images_in_flight[image] != vk::Fence::null() {
            let fences = [self.images_in_flight[image]];
            unsafe {
                self.device
                    .handle()
                    .wait_for_fences(&fences, true, WAIT_TIMEOUT_NS)?;
            }
        }

        let sync = &self.frame_syncs[self.current_frame];
        self.images_in_flight[image] = sync.in_flight().handle();

        sync.in_flight().reset()?;

        let wait_semaphores = [sync.image_available().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [sync.render_finished().handle()];
        let command_buffers = [command_buffer];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .submit_graphics(&[submit_info], sync.in_flight().handle())?;
        }

        Ok(())
    }

    /// Requests presentation of a submitted image and advances the ring.
    ///
    /// Presentation waits on the slot's render-finished semaphore. The ring
    /// cursor advances regardless of the outcome so the next frame uses a
    /// fresh slot.
    ///
    /// # Errors
    ///
    /// `SUBOPTIMAL_KHR` and `ERROR_OUT_OF_DATE_KHR` are reported through
    /// [`SwapchainStatus`]; any other failure is fatal.
    pub fn present(&mut self, image_index: u32) -> RhiResult<SwapchainStatus> {
        let sync = &self.frame_syncs[self.current_frame];

        let wait_semaphores = [sync.render_finished().handle()];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe {
            self.loader
                .queue_present(self.device.present_queue(), &present_info)
        };

        self.current_frame = next_frame_index(self.current_frame);

        match result {
            Ok(false) => Ok(SwapchainStatus::Optimal),
            Ok(true) => {
                debug!("Swapchain suboptimal during present");
                Ok(SwapchainStatus::Suboptimal)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during present");
                Ok(SwapchainStatus::OutOfDate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the number of presentable images.
    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Returns the render pass the chain's framebuffers are built for.
    #[inline]
    pub fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }

    /// Returns the framebuffer for an image index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds; acquire only hands out indices
    /// in `[0, image_count)`.
    #[inline]
    pub fn framebuffer(&self, index: usize) -> vk::Framebuffer {
        self.framebuffers[index]
    }

    /// Returns the image extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns the negotiated color format.
    #[inline]
    pub fn color_format(&self) -> vk::Format {
        self.color_format
    }

    /// Returns the present mode in use.
    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Returns true when both chains use the same attachment formats, i.e.
    /// their render passes are interchangeable.
    pub fn is_compatible_with(&self, other: &Swapchain) -> bool {
        self.render_pass.color_format() == other.render_pass.color_format()
            && self.render_pass.depth_format() == other.render_pass.depth_format()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.device.handle().destroy_framebuffer(framebuffer, None);
            }
            for &view in &self.image_views {
                self.device.handle().destroy_image_view(view, None);
            }
            // The images themselves belong to the swapchain
            self.loader.destroy_swapchain(self.swapchain, None);
        }

        info!(
            "Swapchain destroyed ({}x{}, {} images)",
            self.extent.width,
            self.extent.height,
            self.images.len()
        );
    }
}

/// Advances the frame ring cursor.
fn next_frame_index(frame: usize) -> usize {
    (frame + 1) % MAX_FRAMES_IN_FLIGHT
}

/// Picks the surface format, preferring B8G8R8A8_SRGB with a nonlinear
/// SRGB color space and falling back to the first offer.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .copied()
        .unwrap_or_else(|| {
            warn!(
                "Preferred surface format unavailable, using {:?}",
                formats[0].format
            );
            formats[0]
        })
}

/// Picks the present mode: MAILBOX when offered, otherwise FIFO (which the
/// specification guarantees).
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Resolves the swapchain extent: the surface-dictated extent when fixed,
/// otherwise the requested extent clamped to the surface limits.
fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    requested: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: requested.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: requested.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// Picks the image count: one above the minimum (so acquire rarely blocks
/// on the driver), capped at the surface maximum when one exists.
fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;

    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}

/// Finds a depth format the device supports as an optimally tiled depth
/// attachment.
fn find_depth_format(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> RhiResult<vk::Format> {
    for &format in DEPTH_FORMAT_CANDIDATES {
        let props =
            unsafe { instance.get_physical_device_format_properties(physical_device, format) };
        if props
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        {
            return Ok(format);
        }
    }

    Err(RhiError::Swapchain(
        "no supported depth attachment format".to_string(),
    ))
}

/// Creates one color image view per presentable image.
fn create_image_views(
    device: &Device,
    images: &[vk::Image],
    format: vk::Format,
) -> RhiResult<Vec<vk::ImageView>> {
    let mut views = Vec::with_capacity(images.len());

    for &image in images {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let view = unsafe { device.handle().create_image_view(&create_info, None)? };
        views.push(view);
    }

    Ok(views)
}

/// Creates one framebuffer per image, attaching color then depth in the
/// order the render pass declares them.
fn create_framebuffers(
    device: &Device,
    render_pass: &RenderPass,
    image_views: &[vk::ImageView],
    depth_targets: &[DepthTarget],
    extent: vk::Extent2D,
) -> RhiResult<Vec<vk::Framebuffer>> {
    let mut framebuffers = Vec::with_capacity(image_views.len());

    for (view, depth) in image_views.iter().zip(depth_targets) {
        let attachments = [*view, depth.view];

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.handle())
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.handle().create_framebuffer(&create_info, None)? };
        framebuffers.push(framebuffer);
    }

    debug!("Created {} framebuffers", framebuffers.len());
    Ok(framebuffers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_ring_cycles_modulo_max_frames() {
        let mut frame = 0;
        for _ in 0..(MAX_FRAMES_IN_FLIGHT * 3) {
            assert!(frame < MAX_FRAMES_IN_FLIGHT);
            frame = next_frame_index(frame);
        }
        assert_eq!(next_frame_index(MAX_FRAMES_IN_FLIGHT - 1), 0);
    }

    #[test]
    fn choose_surface_format_prefers_srgb() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn choose_surface_format_falls_back_to_first() {
        let formats = vec![vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];

        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::R8G8B8A8_UNORM
        );
    }

    #[test]
    fn choose_present_mode_prefers_mailbox() {
        let modes = vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn choose_present_mode_falls_back_to_fifo() {
        let modes = vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn choose_extent_uses_surface_dictated_extent() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        };

        let extent = choose_extent(
            &capabilities,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        );
        assert_eq!(extent.width, 1920);
        assert_eq!(extent.height, 1080);
    }

    #[test]
    fn choose_extent_clamps_requested_extent() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 100,
                height: 100,
            },
            max_image_extent: vk::Extent2D {
                width: 2000,
                height: 2000,
            },
            ..Default::default()
        };

        let too_big = choose_extent(
            &capabilities,
            vk::Extent2D {
                width: 3000,
                height: 3000,
            },
        );
        assert_eq!((too_big.width, too_big.height), (2000, 2000));

        let too_small = choose_extent(
            &capabilities,
            vk::Extent2D {
                width: 50,
                height: 50,
            },
        );
        assert_eq!((too_small.width, too_small.height), (100, 100));

        let in_range = choose_extent(
            &capabilities,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        );
        assert_eq!((in_range.width, in_range.height), (800, 600));
    }

    #[test]
    fn image_count_is_at_least_two() {
        // Valid surfaces advertise at least one image; the selection always
        // asks for one more than the minimum.
        for min in 1..=3 {
            let capabilities = vk::SurfaceCapabilitiesKHR {
                min_image_count: min,
                max_image_count: 0,
                ..Default::default()
            };
            assert!(choose_image_count(&capabilities) >= 2);
        }
    }

    #[test]
    fn image_count_respects_surface_maximum() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&capabilities), 3);

        let roomy = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&roomy), 3);
    }

    #[test]
    fn swapchain_support_adequacy() {
        let adequate = SwapchainSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(adequate.is_adequate());

        let no_formats = SwapchainSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(!no_formats.is_adequate());

        let no_modes = SwapchainSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![],
        };
        assert!(!no_modes.is_adequate());
    }
}
