//! Error types for tilemorph-recon

use thiserror::Error;

use crate::connectivity::Connectivity;

/// Errors that can occur during reconstruction
#[derive(Debug, Error)]
pub enum ReconError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] tilemorph_core::Error),

    /// Error from the flat morphology collaborator
    #[error("morphology error: {0}")]
    Morph(#[from] tilemorph_morph::MorphError),

    /// Work, mask or scratch arrays differ in extent
    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// A stencil op's neighbor offsets disagree with its declared connectivity
    #[error("stencil op declares {connectivity:?} but exposes {offsets} neighbor offsets")]
    ConnectivityMismatch {
        connectivity: Connectivity,
        offsets: usize,
    },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for reconstruction operations
pub type ReconResult<T> = Result<T, ReconError>;
