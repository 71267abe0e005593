//! Border-seeded fills
//!
//! Hole filling and border-component removal, both driven from the image
//! border. Foreground is any nonzero pixel; outputs are 0/255.

use log::debug;
use tilemorph_core::{DeviceGrid, FPix};

use crate::connectivity::Connectivity;
use crate::error::ReconResult;
use crate::kernels::FillRule;
use crate::reconstruct::{ReconstructOptions, Reconstructor, reconstruct};
use crate::stencil::Direction;

/// Mark the background reachable from the image border.
///
/// Returns an image that is 255 on every pixel connected to the border
/// through pixels where `src` is 0, and 0 elsewhere.
pub fn fill_background_from_border(src: &FPix, connectivity: Connectivity) -> ReconResult<FPix> {
    let (w, h) = src.dimensions();
    let src_grid = DeviceGrid::upload(src);
    let marker = DeviceGrid::zeroed(w, h)?;

    let stats = Reconstructor::new().fill_from_border(&src_grid, &marker, connectivity)?;
    debug!("border fill {}x{}: {} launches", w, h, stats.launches);
    Ok(marker.download()?)
}

/// Fill the holes of the foreground.
///
/// A hole is a zero pixel not connected to the border through zero pixels.
/// The output is 255 on foreground and holes, 0 on the background reachable
/// from the border. 4-connectivity of the background is the usual choice; it
/// makes the foreground 8-connected.
///
/// # Examples
///
/// ```
/// use tilemorph_core::FPix;
/// use tilemorph_recon::{Connectivity, fill_holes};
///
/// let src = FPix::from_rows(&[
///     [0.0, 0.0, 0.0, 0.0, 0.0],
///     [0.0, 255.0, 255.0, 255.0, 0.0],
///     [0.0, 255.0, 0.0, 255.0, 0.0],
///     [0.0, 255.0, 255.0, 255.0, 0.0],
///     [0.0, 0.0, 0.0, 0.0, 0.0],
/// ])
/// .unwrap();
/// let filled = fill_holes(&src, Connectivity::FourWay).unwrap();
/// assert_eq!(filled.get_pixel(2, 2).unwrap(), 255.0);
/// assert_eq!(filled.count_value(255.0), 9);
/// ```
pub fn fill_holes(src: &FPix, connectivity: Connectivity) -> ReconResult<FPix> {
    let marker = fill_background_from_border(src, connectivity)?;
    Ok(marker.map(|v| FillRule::FILL - v))
}

/// Remove the foreground components that touch the image border.
///
/// The marker is `src` on the border pixels and 0 inside; its reconstruction
/// by dilation under `src` is exactly the border-touching part, which is
/// subtracted from `src`.
pub fn delete_border_components(src: &FPix, connectivity: Connectivity) -> ReconResult<FPix> {
    let (w, h) = src.dimensions();
    let mut marker = src.create_template();
    for y in 0..h {
        for x in 0..w {
            if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                marker.set_pixel_unchecked(x, y, src.get_pixel_unchecked(x, y));
            }
        }
    }

    reconstruct(
        &mut marker,
        src,
        Direction::Dilate,
        &ReconstructOptions::new(connectivity),
    )?;
    Ok(src.sub(&marker)?)
}
