//! Data-parallel device model
//!
//! Kernels in tilemorph are written against a small SIMT-style model:
//!
//! - [`DeviceGrid`] - device memory, atomically accessible from every block
//! - [`Grid2d`] / [`Grid1d`] - launch geometry; `launch` runs a kernel once
//!   per block, blocks in parallel
//! - [`SharedTile`] - block-local copy of a tile and its halo
//!
//! There is no synchronization between blocks inside a launch. Anything a
//! later launch needs must be written to device memory, and the host reads
//! counters back only after `launch` returns.

mod grid;
mod launch;
mod tile;

pub use grid::DeviceGrid;
pub use launch::{Block1d, Block2d, Grid1d, Grid2d, div_up};
pub use tile::SharedTile;
