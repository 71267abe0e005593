//! Spur pruning of binary skeletons
//!
//! Pruning removes short branches from a thin foreground:
//!
//! 1. `max_thinning_iter` thinning passes delete end pixels, eating every
//!    branch from its free end
//! 2. The end pixels of what is left are detected with a hit-or-miss pass
//! 3. Those end points are grown back along the original foreground by a
//!    bounded reconstruction, restoring the main branches' lost length
//!
//! A pixel is an end pixel if it is set, exactly one of its 8 neighbors is
//! set, or two adjacent ones where one is a 4-neighbor. Pixels outside the
//! image read as `f32::MAX`, so nothing on the image border is an end pixel.

use tilemorph_core::{DeviceGrid, FPix, SharedTile};

use crate::connectivity::Connectivity;
use crate::error::{ReconError, ReconResult};
use crate::kernels::{bulk_grid, check_extent};
use crate::reconstruct::{ReconstructOptions, reconstruct};
use crate::stencil::{Direction, Neighborhood};

/// Value written for detected end points
const END_POINT: f32 = 255.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpurStencil {
    /// Clear end pixels, keep everything else
    Thin,
    /// 255 on end pixels, 0 elsewhere
    EndPoints,
}

/// True if the center of `n` is an end pixel.
fn is_end_pixel(n: &Neighborhood) -> bool {
    let p1 = n.center();
    if p1 <= 0.0 {
        return false;
    }
    let p2 = n.at(0, -1);
    let p3 = n.at(1, -1);
    let p4 = n.at(1, 0);
    let p5 = n.at(1, 1);
    let p6 = n.at(0, 1);
    let p7 = n.at(-1, 1);
    let p8 = n.at(-1, 0);
    let p9 = n.at(-1, -1);

    // a 4-neighbor set, plus optionally the two diagonals beside it
    (p2 > 0.0 && p4 + p5 + p6 + p7 + p8 == 0.0)
        || (p4 > 0.0 && p2 + p6 + p7 + p8 + p9 == 0.0)
        || (p6 > 0.0 && p2 + p3 + p4 + p8 + p9 == 0.0)
        || (p8 > 0.0 && p2 + p3 + p4 + p5 + p6 == 0.0)
        // a single diagonal neighbor set
        || (p9 > 0.0 && p2 + p3 + p4 + p5 + p6 + p7 + p8 == 0.0)
        || (p3 > 0.0 && p2 + p9 + p4 + p5 + p6 + p7 + p8 == 0.0)
        || (p5 > 0.0 && p2 + p3 + p4 + p9 + p6 + p7 + p8 == 0.0)
        || (p7 > 0.0 && p2 + p3 + p4 + p5 + p6 + p9 + p8 == 0.0)
}

/// One 3x3 spur stencil pass from `src` into `dst`.
fn spur_pass(src: &DeviceGrid, dst: &DeviceGrid, stencil: SpurStencil) -> ReconResult<()> {
    check_extent(src, dst)?;
    let grid = bulk_grid(src)?;

    grid.launch(|block| {
        let tile = SharedTile::load(src, &block, 1, 1, f32::MAX);
        for t in 0..block.thread_count() {
            let Some((x, y)) = block.pixel(t) else {
                continue;
            };
            let n = Neighborhood::from_tile(&tile, x, y);
            let end = is_end_pixel(&n);
            let value = match stencil {
                SpurStencil::Thin if end => 0.0,
                SpurStencil::Thin => n.center(),
                SpurStencil::EndPoints if end => END_POINT,
                SpurStencil::EndPoints => 0.0,
            };
            dst.store(x, y, value);
        }
    });
    Ok(())
}

/// Prune spurs of a binary skeleton.
///
/// # Arguments
///
/// * `src` - Binary skeleton, foreground > 0
/// * `max_thinning_iter` - Thinning passes; branches up to this length are
///   removed. Must be > 0
/// * `max_dilate_iter` - Passes of the end-point reconstruction; 0 means
///   `max_thinning_iter + 1`
///
/// The output keeps the thinned skeleton at its original values and sets the
/// regrown pixels to 255.
///
/// # Errors
///
/// Returns `ReconError::InvalidParameters` if `max_thinning_iter` is 0.
pub fn prune(src: &FPix, max_thinning_iter: u32, max_dilate_iter: u32) -> ReconResult<FPix> {
    if max_thinning_iter == 0 {
        return Err(ReconError::InvalidParameters(
            "max_thinning_iter must be > 0".to_string(),
        ));
    }
    let (w, h) = src.dimensions();
    let mut current = DeviceGrid::upload(src);
    let mut scratch = DeviceGrid::zeroed(w, h)?;
    for _ in 0..max_thinning_iter {
        spur_pass(&current, &scratch, SpurStencil::Thin)?;
        std::mem::swap(&mut current, &mut scratch);
    }

    spur_pass(&current, &scratch, SpurStencil::EndPoints)?;
    let thinned = current.download()?;
    let mut grown = scratch.download()?;

    let passes = if max_dilate_iter == 0 {
        max_thinning_iter.saturating_add(1)
    } else {
        max_dilate_iter
    };
    let options = ReconstructOptions::new(Connectivity::EightWay).with_max_iter(passes);
    reconstruct(&mut grown, src, Direction::Dilate, &options)?;

    Ok(thinned.max_with(&grown)?)
}
