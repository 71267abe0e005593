//! Grayscale morphological operations
//!
//! Flat structuring-element erosion, dilation, opening and closing for `f32`
//! images.
//!
//! # Algorithm
//!
//! Each pass is a single tiled stencil launch. A block loads its 32x32 tile
//! plus a halo as wide as the SEL's reach, then every thread folds the
//! extremum over the SEL's hit offsets:
//! - **Dilation**: maximum over the neighborhood
//! - **Erosion**: minimum over the neighborhood
//! - **Opening**: Erosion followed by dilation (removes small bright features)
//! - **Closing**: Dilation followed by erosion (fills small dark features)
//!
//! Pixels outside the image read as `-f32::MAX` for dilation and `f32::MAX`
//! for erosion, so they never win.

use tilemorph_core::{DeviceGrid, FPix, Grid2d, SharedTile};

use crate::{MorphError, MorphResult, Sel};

/// Tile edge length of the stencil launch
pub const GRAY_TILE_SIZE: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Max,
    Min,
}

impl Extremum {
    fn sentinel(self) -> f32 {
        match self {
            Extremum::Max => -f32::MAX,
            Extremum::Min => f32::MAX,
        }
    }

    fn pick(self, a: f32, b: f32) -> f32 {
        match self {
            Extremum::Max => a.max(b),
            Extremum::Min => a.min(b),
        }
    }
}

/// One stencil pass from `src` into `dst`.
fn flat_pass(
    src: &DeviceGrid,
    dst: &DeviceGrid,
    offsets: &[(i32, i32)],
    reach: (u32, u32),
    op: Extremum,
) -> MorphResult<()> {
    let grid = Grid2d::new(src.width(), src.height(), GRAY_TILE_SIZE)?;
    let sentinel = op.sentinel();

    grid.launch(|block| {
        let tile = SharedTile::load(src, &block, reach.0, reach.1, sentinel);
        for t in 0..block.thread_count() {
            let Some((x, y)) = block.pixel(t) else {
                continue;
            };
            let value = offsets.iter().fold(sentinel, |acc, &(dx, dy)| {
                op.pick(acc, tile.get(x as i32 + dx, y as i32 + dy))
            });
            dst.store(x, y, value);
        }
    });
    Ok(())
}

fn run_passes(src: &FPix, sel: &Sel, iterations: u32, op: Extremum) -> MorphResult<FPix> {
    if iterations == 0 {
        return Err(MorphError::InvalidParameters(
            "iterations must be >= 1".to_string(),
        ));
    }
    let offsets: Vec<(i32, i32)> = sel.hit_offsets().collect();
    if offsets.is_empty() {
        return Err(MorphError::InvalidSel("SEL has no hits".to_string()));
    }
    let reach = sel.reach();

    let mut cur = DeviceGrid::upload(src);
    let mut next = DeviceGrid::zeroed(src.width(), src.height())?;
    for _ in 0..iterations {
        flat_pass(&cur, &next, &offsets, reach, op)?;
        std::mem::swap(&mut cur, &mut next);
    }
    Ok(cur.download()?)
}

/// Dilate a grayscale image with a flat structuring element
///
/// Dilation computes the maximum pixel value in the SE neighborhood,
/// which expands bright regions and shrinks dark regions.
///
/// # Arguments
///
/// * `src` - Input image
/// * `sel` - Structuring element; only hits are used
/// * `iterations` - Number of passes (>= 1)
pub fn dilate_gray(src: &FPix, sel: &Sel, iterations: u32) -> MorphResult<FPix> {
    run_passes(src, sel, iterations, Extremum::Max)
}

/// Erode a grayscale image with a flat structuring element
///
/// Erosion computes the minimum pixel value in the SE neighborhood,
/// which shrinks bright regions and expands dark regions.
pub fn erode_gray(src: &FPix, sel: &Sel, iterations: u32) -> MorphResult<FPix> {
    run_passes(src, sel, iterations, Extremum::Min)
}

/// Open a grayscale image (erosion followed by dilation)
///
/// Opening removes small bright features while preserving the overall shape.
pub fn open_gray(src: &FPix, sel: &Sel, iterations: u32) -> MorphResult<FPix> {
    let eroded = erode_gray(src, sel, iterations)?;
    dilate_gray(&eroded, sel, iterations)
}

/// Close a grayscale image (dilation followed by erosion)
///
/// Closing fills small dark features while preserving the overall shape.
pub fn close_gray(src: &FPix, sel: &Sel, iterations: u32) -> MorphResult<FPix> {
    let dilated = dilate_gray(src, sel, iterations)?;
    erode_gray(&dilated, sel, iterations)
}

/// Grayscale morphological gradient (dilation - erosion)
pub fn gradient_gray(src: &FPix, sel: &Sel) -> MorphResult<FPix> {
    let dilated = dilate_gray(src, sel, 1)?;
    let eroded = erode_gray(src, sel, 1)?;
    Ok(dilated.sub(&eroded)?)
}

/// Grayscale top-hat transform (original - opening)
///
/// Extracts bright features smaller than the structuring element.
pub fn top_hat_gray(src: &FPix, sel: &Sel, iterations: u32) -> MorphResult<FPix> {
    let opened = open_gray(src, sel, iterations)?;
    Ok(src.sub(&opened)?)
}

/// Grayscale bottom-hat transform (closing - original)
///
/// Extracts dark features smaller than the structuring element.
pub fn bottom_hat_gray(src: &FPix, sel: &Sel, iterations: u32) -> MorphResult<FPix> {
    let closed = close_gray(src, sel, iterations)?;
    Ok(closed.sub(src)?)
}
