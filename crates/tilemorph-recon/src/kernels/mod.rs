//! Device kernels of the reconstruction engine
//!
//! - [`bulk`] - full-grid clipped stencil pass, optionally flagging changed tiles
//! - [`extract`] - full-grid pass that compacts changed pixels into a seed list
//! - [`propagate`] - worklist round over a seed list with a bounded local stack
//!
//! All kernels read the mask through the same [`ExtremumOp`](crate::ExtremumOp)
//! and connectivity table.

pub mod bulk;
pub mod extract;
pub mod propagate;

pub use bulk::{BULK_TILE_SIZE, FLAG_BANKS, bulk_grid, bulk_pass};
pub use extract::{border_pixel_count, extract_seeds, seed_border};
pub use propagate::{
    FillRule, GeodesicRule, MICRO_ROUNDS, PROPAGATION_BLOCK, PropagationRule,
    local_stack_capacity, propagate,
};

use tilemorph_core::DeviceGrid;

use crate::error::{ReconError, ReconResult};

/// Fail fast unless `grid` has the extent of `reference`.
pub(crate) fn check_extent(reference: &DeviceGrid, grid: &DeviceGrid) -> ReconResult<()> {
    if reference.dimensions() != grid.dimensions() {
        return Err(ReconError::DimensionMismatch {
            expected: reference.dimensions(),
            actual: grid.dimensions(),
        });
    }
    Ok(())
}
