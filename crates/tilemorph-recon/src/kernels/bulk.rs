//! Tiled bulk iteration kernel
//!
//! One launch recomputes every pixel:
//! `dst[p] = clip(extremum(src over p's neighborhood), mask[p])`.
//! Each block loads its tile plus a one-pixel halo; pixels beyond the image
//! read as the direction's sentinel.

use tilemorph_core::{DeviceGrid, Grid2d, SharedTile};

use super::check_extent;
use crate::error::{ReconError, ReconResult};
use crate::seeds::TileFlags;
use crate::stencil::{ExtremumOp, Neighborhood};

/// Tile edge length of the bulk and extraction launches
pub const BULK_TILE_SIZE: u32 = 32;

/// Number of shared counters a block spreads its change count over
pub const FLAG_BANKS: usize = 8;

/// Launch geometry of a bulk pass over `grid`.
pub fn bulk_grid(grid: &DeviceGrid) -> ReconResult<Grid2d> {
    Ok(Grid2d::new(grid.width(), grid.height(), BULK_TILE_SIZE)?)
}

/// One clipped stencil pass from `src` into `dst`.
///
/// With `flags`, each block stores the number of its pixels whose value
/// changed; `flags` must hold one entry per tile of [`bulk_grid`].
///
/// # Errors
///
/// Returns `ReconError::DimensionMismatch` if the grids differ in extent and
/// `ReconError::InvalidParameters` if `flags` has the wrong length.
pub fn bulk_pass<O: ExtremumOp>(
    src: &DeviceGrid,
    dst: &DeviceGrid,
    mask: &DeviceGrid,
    op: &O,
    flags: Option<&TileFlags>,
) -> ReconResult<()> {
    check_extent(mask, src)?;
    check_extent(mask, dst)?;
    let grid = bulk_grid(mask)?;
    if let Some(flags) = flags {
        if flags.len() != grid.block_count() {
            return Err(ReconError::InvalidParameters(format!(
                "{} tile flags for {} tiles",
                flags.len(),
                grid.block_count()
            )));
        }
    }

    let dir = op.direction();
    grid.launch(|block| {
        let tile = SharedTile::load(src, &block, 1, 1, dir.sentinel());
        let mut banks = [0u32; FLAG_BANKS];

        for t in 0..block.thread_count() {
            let Some((x, y)) = block.pixel(t) else {
                continue;
            };
            let n = Neighborhood::from_tile(&tile, x, y);
            let new = dir.clip(op.compute(&n), mask.load(x, y));
            dst.store(x, y, new);
            if new != n.center() {
                banks[t % FLAG_BANKS] += 1;
            }
        }

        if let Some(flags) = flags {
            flags.set(block.linear, banks.iter().sum());
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::Connectivity;
    use crate::stencil::Extremum;
    use tilemorph_core::FPix;

    #[test]
    fn test_bulk_pass_single_step() {
        let mut seed = FPix::new(5, 5).unwrap();
        seed.set_pixel(2, 2, 10.0).unwrap();
        let mut mask = FPix::new_with_value(5, 5, 10.0).unwrap();
        mask.set_pixel(3, 3, 4.0).unwrap();

        let src = DeviceGrid::upload(&seed);
        let dst = DeviceGrid::zeroed(5, 5).unwrap();
        let mask = DeviceGrid::upload(&mask);
        let op = Extremum::dilate(Connectivity::EightWay);
        let flags = TileFlags::new(1);

        bulk_pass(&src, &dst, &mask, &op, Some(&flags)).unwrap();
        let out = dst.download().unwrap();
        assert_eq!(out.get_pixel(1, 1).unwrap(), 10.0);
        assert_eq!(out.get_pixel(3, 3).unwrap(), 4.0);
        assert_eq!(out.get_pixel(0, 0).unwrap(), 0.0);
        assert_eq!(out.count_value(10.0), 8);
        assert_eq!(flags.sum(), 8);
    }

    #[test]
    fn test_bulk_pass_flags_per_tile() {
        let mut seed = FPix::new(70, 40).unwrap();
        seed.set_pixel(0, 0, 1.0).unwrap();
        let src = DeviceGrid::upload(&seed);
        let dst = DeviceGrid::zeroed(70, 40).unwrap();
        let mask = DeviceGrid::filled(70, 40, 1.0).unwrap();
        let grid = bulk_grid(&mask).unwrap();
        assert_eq!(grid.block_count(), 6);

        let flags = TileFlags::new(grid.block_count());
        let op = Extremum::dilate(Connectivity::FourWay);
        bulk_pass(&src, &dst, &mask, &op, Some(&flags)).unwrap();
        assert_eq!(flags.sum(), 2);

        let wrong = TileFlags::new(1);
        assert!(bulk_pass(&src, &dst, &mask, &op, Some(&wrong)).is_err());
    }

    #[test]
    fn test_bulk_pass_extent_mismatch() {
        let a = DeviceGrid::zeroed(4, 4).unwrap();
        let b = DeviceGrid::zeroed(4, 5).unwrap();
        let op = Extremum::erode(Connectivity::FourWay);
        assert!(matches!(
            bulk_pass(&a, &a, &b, &op, None),
            Err(ReconError::DimensionMismatch { .. })
        ));
    }
}
