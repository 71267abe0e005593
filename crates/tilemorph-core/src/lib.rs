//! tilemorph core - image container and device model
//!
//! This crate provides the data structures shared by the tilemorph kernels:
//!
//! - [`FPix`] - Floating-point image, the host-side array type
//! - [`device`] - Software SIMT model: device grids, tiled launches and
//!   block-local shared tiles
//! - [`Error`] / [`Result`] - Core error type

pub mod device;
pub mod error;
pub mod fpix;

pub use device::{Block1d, Block2d, DeviceGrid, Grid1d, Grid2d, SharedTile, div_up};
pub use error::{Error, Result};
pub use fpix::FPix;
