//! GPU buffer management.
//!
//! [`Buffer`] pairs a VkBuffer with a gpu-allocator managed allocation.
//! The renderer's only buffer is the host-visible vertex buffer, written
//! once at construction through the persistently mapped pointer
//! gpu-allocator provides for CpuToGpu memory.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// GPU buffer with managed memory.
pub struct Buffer {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan buffer handle.
    buffer: vk::Buffer,
    /// GPU memory allocation; taken out in Drop.
    allocation: Option<Allocation>,
    /// Buffer size in bytes.
    size: vk::DeviceSize,
    /// Allocation label, for allocator diagnostics.
    label: &'static str,
}

impl Buffer {
    /// Creates a buffer of `size` bytes and binds freshly allocated memory
    /// to it.
    ///
    /// # Arguments
    ///
    /// * `label` - allocation name reported by the allocator
    /// * `usage` - Vulkan buffer usage flags
    /// * `location` - memory location (CpuToGpu for host-written buffers)
    ///
    /// # Errors
    ///
    /// Returns an error for a zero size, or if buffer creation, memory
    /// allocation, or binding fails.
    pub fn new(
        device: Arc<Device>,
        label: &'static str,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
    ) -> RhiResult<Self> {
        if size == 0 {
            return Err(RhiError::Buffer(format!(
                "{label} buffer size must be greater than 0"
            )));
        }

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.handle().create_buffer(&buffer_info, None)? };

        let requirements = unsafe { device.handle().get_buffer_memory_requirements(buffer) };

        let allocation = {
            let mut allocator = match device.allocator().lock() {
                Ok(allocator) => allocator,
                Err(poisoned) => poisoned.into_inner(),
            };
            allocator.allocate(&AllocationCreateDesc {
                name: label,
                requirements,
                location,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())?;
        }

        debug!("Created {} buffer: {} bytes", label, size);

        Ok(Self {
            device,
            buffer,
            allocation: Some(allocation),
            size,
            label,
        })
    }

    /// Creates a host-visible buffer and fills it with `data` in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails or the memory is not mapped
    /// (which CpuToGpu memory always is).
    pub fn new_with_data(
        device: Arc<Device>,
        label: &'static str,
        usage: vk::BufferUsageFlags,
        data: &[u8],
    ) -> RhiResult<Self> {
        let buffer = Self::new(
            device,
            label,
            data.len() as vk::DeviceSize,
            usage,
            MemoryLocation::CpuToGpu,
        )?;
        buffer.write(0, data)?;
        Ok(buffer)
    }

    /// Writes `data` at `offset` through the mapped pointer.
    ///
    /// The allocation's memory type is host-coherent, so no explicit flush
    /// is required.
    ///
    /// # Errors
    ///
    /// Returns an error if the write would run past the end of the buffer
    /// or the memory is not mapped.
    pub fn write(&self, offset: vk::DeviceSize, data: &[u8]) -> RhiResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let end = offset + data.len() as vk::DeviceSize;
        if end > self.size {
            return Err(RhiError::Buffer(format!(
                "write exceeds {} buffer: offset {} + data {} > size {}",
                self.label,
                offset,
                data.len(),
                self.size
            )));
        }

        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| RhiError::Buffer(format!("{} buffer allocation missing", self.label)))?;

        let mapped_ptr = allocation.mapped_ptr().ok_or_else(|| {
            RhiError::Buffer(format!("{} buffer memory is not mapped", self.label))
        })?;

        unsafe {
            let dst = mapped_ptr.as_ptr().cast::<u8>().add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }

        Ok(())
    }

    /// Returns the Vulkan buffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Returns the buffer size in bytes.
    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            let mut allocator = match self.device.allocator().lock() {
                Ok(allocator) => allocator,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free {} buffer allocation: {:?}", self.label, e);
            }
        }

        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
        }

        debug!("Destroyed {} buffer", self.label);
    }
}
