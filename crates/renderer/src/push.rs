//! Per-draw push constants and the fixed demo payload.
//!
//! Every frame draws the same triangle four times, each draw preceded by a
//! distinct [`PushConstants`] block: a vertical offset stepping down the
//! screen and a tint whose blue channel brightens with the draw index.
//! This is the demo's only form of per-draw parameterization; no uniform
//! buffers are involved.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use trigon_rhi::vk;

/// Number of push-constant draws recorded per frame.
pub const DRAWS_PER_FRAME: usize = 4;

/// Push-constant block shared by the vertex and fragment stages.
///
/// # Memory Layout
///
/// Matches the shader's std430 block: `vec2 offset` at byte 0, `vec3 color`
/// at byte 16 (vec3 aligns to 16), total 32 bytes. The padding fields keep
/// the Rust layout identical.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PushConstants {
    /// Offset added to each vertex position, in clip space.
    pub offset: Vec2,
    _pad: [f32; 2],
    /// Tint applied by the fragment stage.
    pub color: Vec3,
    _tail: f32,
}

impl PushConstants {
    /// Size of the block in bytes, for the pipeline layout's push-constant
    /// range.
    pub const SIZE: u32 = std::mem::size_of::<Self>() as u32;

    /// Creates a block with zeroed padding.
    pub const fn new(offset: Vec2, color: Vec3) -> Self {
        Self {
            offset,
            _pad: [0.0; 2],
            color,
            _tail: 0.0,
        }
    }

    /// Shader stages that read the block.
    pub fn stages() -> vk::ShaderStageFlags {
        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
    }
}

/// The per-draw parameters for one frame: four triangles stacked
/// vertically, blue channel stepping from 0.2 to 0.8.
pub fn stacked_draws() -> [PushConstants; DRAWS_PER_FRAME] {
    std::array::from_fn(|i| {
        let step = i as f32;
        PushConstants::new(
            Vec2::new(0.0, -0.4 + 0.25 * step),
            Vec3::new(0.0, 0.0, 0.2 + 0.2 * step),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_constants_layout() {
        use std::mem::offset_of;

        assert_eq!(std::mem::size_of::<PushConstants>(), 32);
        assert_eq!(PushConstants::SIZE, 32);
        assert_eq!(offset_of!(PushConstants, offset), 0);
        assert_eq!(offset_of!(PushConstants, color), 16);
    }

    #[test]
    fn push_constants_stages_cover_both_shaders() {
        let stages = PushConstants::stages();
        assert!(stages.contains(vk::ShaderStageFlags::VERTEX));
        assert!(stages.contains(vk::ShaderStageFlags::FRAGMENT));
    }

    #[test]
    fn one_frame_records_four_draws() {
        assert_eq!(stacked_draws().len(), 4);
    }

    #[test]
    fn draw_tints_step_by_point_two_in_blue() {
        for (i, push) in stacked_draws().iter().enumerate() {
            let expected = 0.2 + 0.2 * i as f32;
            assert!((push.color.z - expected).abs() < f32::EPSILON * 8.0);
            assert_eq!(push.color.x, 0.0);
            assert_eq!(push.color.y, 0.0);
        }
    }

    #[test]
    fn draw_offsets_stack_vertically() {
        for (i, push) in stacked_draws().iter().enumerate() {
            let expected = -0.4 + 0.25 * i as f32;
            assert_eq!(push.offset.x, 0.0);
            assert!((push.offset.y - expected).abs() < f32::EPSILON * 8.0);
        }
    }

    #[test]
    fn draw_parameters_are_distinct() {
        let draws = stacked_draws();
        for i in 0..draws.len() {
            for j in (i + 1)..draws.len() {
                assert_ne!(draws[i], draws[j]);
            }
        }
    }
}
