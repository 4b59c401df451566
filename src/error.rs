//! Typed errors for the handful of operations whose embedding-facing API
//! benefits from a real `Result` instead of the silent-no-op contract used
//! everywhere else in this crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaintError {
    #[error("layer index {0} is out of range")]
    InvalidLayerIndex(usize),
    #[error("canvas dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("no filter registered under the name '{0}'")]
    UnknownFilter(String),
    #[error("blend mode tag {0} does not map to a known BlendMode")]
    InvalidBlendMode(u8),
}
