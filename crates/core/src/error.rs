//! Error types shared outside the RHI layer.

use thiserror::Error;

/// Top-level error type for window and surface plumbing.
#[derive(Error, Debug)]
pub enum Error {
    /// Window creation or management errors
    #[error("window error: {0}")]
    Window(String),

    /// Vulkan errors raised outside the RHI crate (surface creation)
    #[error("Vulkan error: {0}")]
    Vulkan(String),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
