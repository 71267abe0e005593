//! Error types for tilemorph-core
//!
//! Provides a unified error type for the image container and the device
//! model. Each variant captures enough context for diagnostics without
//! exposing internal implementation details.

use thiserror::Error;

/// tilemorph-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid image dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Incompatible image sizes
    #[error("incompatible image sizes: {0}x{1} vs {2}x{3}")]
    IncompatibleSizes(u32, u32, u32, u32),

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid launch geometry
    #[error("invalid launch configuration: {0}")]
    InvalidLaunch(String),
}

/// Result type alias for tilemorph-core operations
pub type Result<T> = std::result::Result<T, Error>;
