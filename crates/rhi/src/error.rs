//! RHI-specific error types.

use thiserror::Error;

/// RHI-specific error type.
///
/// Resource-creation failures carry a message naming the failing resource;
/// raw Vulkan status codes convert via `From`.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    /// Failed to load the Vulkan library
    #[error("failed to load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("allocation error: {0}")]
    Allocation(#[from] gpu_allocator::AllocationError),

    /// No suitable GPU found
    #[error("no suitable GPU found")]
    NoSuitableGpu,

    /// Surface creation or query error
    #[error("surface error: {0}")]
    Surface(String),

    /// Swapchain creation error
    #[error("swapchain error: {0}")]
    Swapchain(String),

    /// Shader loading or module creation error
    #[error("shader error: {0}")]
    Shader(String),

    /// Pipeline or pipeline layout creation error
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Buffer creation or write error
    #[error("buffer error: {0}")]
    Buffer(String),

    /// Rejected geometry (e.g. a degenerate vertex list)
    #[error("geometry error: {0}")]
    Geometry(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;
