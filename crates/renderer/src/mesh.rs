//! Static vertex geometry.
//!
//! [`Mesh`] uploads a caller-supplied vertex list into a host-visible
//! vertex buffer once at construction and records bind and draw commands
//! for it. The data never changes afterwards.

use std::sync::Arc;

use tracing::debug;

use trigon_rhi::buffer::Buffer;
use trigon_rhi::command::CommandBuffer;
use trigon_rhi::device::Device;
use trigon_rhi::vertex::Vertex;
use trigon_rhi::{RhiError, RhiResult, vk};

/// Fewer vertices cannot form a triangle.
pub const MIN_VERTEX_COUNT: usize = 3;

/// Immutable vertex buffer resource.
pub struct Mesh {
    /// Host-visible vertex buffer, written once.
    buffer: Buffer,
    /// Number of vertices drawn per draw call.
    vertex_count: u32,
}

impl Mesh {
    /// Uploads `vertices` into a new vertex buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Geometry`] for fewer than [`MIN_VERTEX_COUNT`]
    /// vertices (checked before any device memory is allocated) and
    /// propagates buffer creation failures.
    pub fn new(device: Arc<Device>, vertices: &[Vertex]) -> RhiResult<Self> {
        let vertex_count = validate_vertex_count(vertices.len())?;

        let buffer = Buffer::new_with_data(
            device,
            "vertex",
            vk::BufferUsageFlags::VERTEX_BUFFER,
            bytemuck::cast_slice(vertices),
        )?;

        debug!("Mesh created with {} vertices", vertex_count);

        Ok(Self {
            buffer,
            vertex_count,
        })
    }

    /// Records a vertex-buffer bind at binding 0.
    pub fn bind(&self, cmd: &CommandBuffer) {
        cmd.bind_vertex_buffers(0, &[self.buffer.handle()], &[0]);
    }

    /// Records a draw of the full vertex count, one instance.
    pub fn draw(&self, cmd: &CommandBuffer) {
        cmd.draw(self.vertex_count, 1, 0, 0);
    }

    /// Returns the vertex count.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Rejects vertex lists that cannot form at least one triangle.
fn validate_vertex_count(count: usize) -> RhiResult<u32> {
    if count < MIN_VERTEX_COUNT {
        return Err(RhiError::Geometry(format!(
            "mesh requires at least {MIN_VERTEX_COUNT} vertices, got {count}"
        )));
    }
    Ok(count as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_vertex_counts_are_rejected() {
        for count in 0..MIN_VERTEX_COUNT {
            let result = validate_vertex_count(count);
            assert!(matches!(result, Err(RhiError::Geometry(_))), "{count}");
        }
    }

    #[test]
    fn valid_vertex_counts_pass() {
        assert_eq!(validate_vertex_count(3).ok(), Some(3));
        assert_eq!(validate_vertex_count(6).ok(), Some(6));
    }
}
