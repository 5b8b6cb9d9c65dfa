//! Shared foundations for the trigon renderer:
//! - Error type and result alias used by the platform layer
//! - Logging initialization

mod error;
mod logging;

pub use error::{Error, Result};
pub use logging::init_logging;
