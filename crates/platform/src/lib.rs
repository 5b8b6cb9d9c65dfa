//! Platform layer: window management and Vulkan surface creation.

mod window;

pub use window::{Surface, Window};
