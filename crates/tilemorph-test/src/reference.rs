//! Sequential reference reconstruction
//!
//! A plain raster-scan implementation used as the oracle in regression
//! tests. Alternating forward and backward scans update pixels in place
//! until a full round changes nothing.

use tilemorph_core::FPix;

/// Which way the reference reconstruction moves values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOp {
    /// Reconstruction by dilation under the mask
    Dilate,
    /// Reconstruction by erosion above the mask
    Erode,
}

/// Reconstruct `seed` against `mask` with the neighbor set `offsets`.
///
/// `offsets` lists the (dx, dy) of the neighbors, center excluded.
///
/// # Panics
///
/// Panics if the images differ in size.
pub fn reference_reconstruct(
    seed: &FPix,
    mask: &FPix,
    offsets: &[(i32, i32)],
    op: ReferenceOp,
) -> FPix {
    assert_eq!(seed.dimensions(), mask.dimensions());
    let (w, h) = (seed.width() as i32, seed.height() as i32);
    let mut work = seed.clone();

    let update = |work: &mut FPix, x: i32, y: i32| -> bool {
        let center = work.get_pixel_unchecked(x as u32, y as u32);
        let mut v = center;
        for &(dx, dy) in offsets {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            let n = work.get_pixel_unchecked(nx as u32, ny as u32);
            v = match op {
                ReferenceOp::Dilate => v.max(n),
                ReferenceOp::Erode => v.min(n),
            };
        }
        let m = mask.get_pixel_unchecked(x as u32, y as u32);
        v = match op {
            ReferenceOp::Dilate => v.min(m),
            ReferenceOp::Erode => v.max(m),
        };
        if v != center {
            work.set_pixel_unchecked(x as u32, y as u32, v);
            true
        } else {
            false
        }
    };

    loop {
        let mut changed = false;
        for y in 0..h {
            for x in 0..w {
                changed |= update(&mut work, x, y);
            }
        }
        for y in (0..h).rev() {
            for x in (0..w).rev() {
                changed |= update(&mut work, x, y);
            }
        }
        if !changed {
            return work;
        }
    }
}
