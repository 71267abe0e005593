//! Geodesic operators
//!
//! Reconstruction by dilation or erosion of a seed image, and the opening,
//! closing and hat transforms that use it to restore the shapes a flat
//! erosion (or dilation) did not remove entirely.

use tilemorph_core::FPix;
use tilemorph_morph::{Sel, dilate_gray, erode_gray};

use crate::connectivity::Connectivity;
use crate::error::ReconResult;
use crate::reconstruct::{ReconstructOptions, reconstruct};
use crate::stencil::Direction;

/// Reconstruction by dilation of `seed` under `mask`.
///
/// `seed` should lie at or below `mask` everywhere; pixels above it are
/// clipped down by the first pass but may leak into their neighbors.
///
/// # Errors
///
/// Returns `ReconError::DimensionMismatch` if the images differ in size.
pub fn geodesic_dilate(seed: &FPix, mask: &FPix, options: &ReconstructOptions) -> ReconResult<FPix> {
    let mut work = seed.clone();
    reconstruct(&mut work, mask, Direction::Dilate, options)?;
    Ok(work)
}

/// Reconstruction by erosion of `seed` above `mask`.
///
/// `seed` should lie at or above `mask` everywhere.
///
/// # Errors
///
/// Returns `ReconError::DimensionMismatch` if the images differ in size.
pub fn geodesic_erode(seed: &FPix, mask: &FPix, options: &ReconstructOptions) -> ReconResult<FPix> {
    let mut work = seed.clone();
    reconstruct(&mut work, mask, Direction::Erode, options)?;
    Ok(work)
}

/// Opening by reconstruction.
///
/// Erodes `src` `erode_iter` times with `sel`, then reconstructs the result
/// by dilation under `src`. Bright structures that survive the erosion come
/// back with their original shape; the rest are removed.
///
/// # Arguments
///
/// * `src` - Input image
/// * `sel` - Flat structuring element of the erosion
/// * `erode_iter` - Number of erosion passes, must be > 0
/// * `options` - Connectivity and pass budget of the reconstruction
pub fn geodesic_open(
    src: &FPix,
    sel: &Sel,
    erode_iter: u32,
    options: &ReconstructOptions,
) -> ReconResult<FPix> {
    let marker = erode_gray(src, sel, erode_iter)?;
    geodesic_dilate(&marker, src, options)
}

/// Closing by reconstruction.
///
/// Dilates `src` `dilate_iter` times with `sel`, then reconstructs the
/// result by erosion above `src`.
pub fn geodesic_close(
    src: &FPix,
    sel: &Sel,
    dilate_iter: u32,
    options: &ReconstructOptions,
) -> ReconResult<FPix> {
    let marker = dilate_gray(src, sel, dilate_iter)?;
    geodesic_erode(&marker, src, options)
}

/// Top-hat by reconstruction: `src - geodesic_open(src)`.
///
/// Keeps the bright structures that an erosion with `sel` removes entirely.
/// The reconstruction is 4-connected.
pub fn reconstruction_top_hat(src: &FPix, sel: &Sel, erode_iter: u32) -> ReconResult<FPix> {
    let opened = geodesic_open(
        src,
        sel,
        erode_iter,
        &ReconstructOptions::new(Connectivity::FourWay),
    )?;
    Ok(src.sub(&opened)?)
}

/// Black-hat by reconstruction: `geodesic_close(src) - src`.
///
/// Keeps the dark structures that a dilation with `sel` removes entirely.
/// The reconstruction is 4-connected.
pub fn reconstruction_black_hat(src: &FPix, sel: &Sel, dilate_iter: u32) -> ReconResult<FPix> {
    let closed = geodesic_close(
        src,
        sel,
        dilate_iter,
        &ReconstructOptions::new(Connectivity::FourWay),
    )?;
    Ok(closed.sub(src)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconError;

    /// 12x12 image: a 5x5 square of 100 at (2..7, 2..7) and a lone 200 at
    /// (10, 10)
    fn square_and_spike() -> FPix {
        let mut pix = FPix::new(12, 12).unwrap();
        for y in 2..7 {
            for x in 2..7 {
                pix.set_pixel(x, y, 100.0).unwrap();
            }
        }
        pix.set_pixel(10, 10, 200.0).unwrap();
        pix
    }

    #[test]
    fn test_geodesic_dilate_stays_under_mask() {
        let mut seed = FPix::new(6, 1).unwrap();
        seed.set_pixel(0, 0, 3.0).unwrap();
        let mask = FPix::from_rows(&[[5.0, 5.0, 2.0, 5.0, 5.0, 0.0]]).unwrap();

        let out = geodesic_dilate(&seed, &mask, &ReconstructOptions::default()).unwrap();
        assert_eq!(out.row(0), &[3.0, 3.0, 2.0, 2.0, 2.0, 0.0]);
        assert_eq!(seed.get_pixel(1, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_geodesic_open_removes_spike() {
        let src = square_and_spike();
        let sel = Sel::create_square(3).unwrap();
        let out = geodesic_open(&src, &sel, 1, &ReconstructOptions::default()).unwrap();

        assert_eq!(out.count_value(100.0), 25);
        assert_eq!(out.get_pixel(10, 10).unwrap(), 0.0);
        assert_eq!(out.get_pixel(2, 2).unwrap(), 100.0);
    }

    #[test]
    fn test_reconstruction_top_hat() {
        let src = square_and_spike();
        let sel = Sel::create_square(3).unwrap();
        let out = reconstruction_top_hat(&src, &sel, 1).unwrap();

        assert_eq!(out.get_pixel(10, 10).unwrap(), 200.0);
        assert_eq!(out.count_value(0.0), 143);
    }

    #[test]
    fn test_geodesic_close_and_black_hat() {
        // A dark 5x5 pit survives the closing; a dark single pixel does not
        let mut src = FPix::new_with_value(12, 12, 100.0).unwrap();
        for y in 2..7 {
            for x in 2..7 {
                src.set_pixel(x, y, 0.0).unwrap();
            }
        }
        src.set_pixel(10, 10, 0.0).unwrap();
        let sel = Sel::create_square(3).unwrap();

        let closed = geodesic_close(&src, &sel, 1, &ReconstructOptions::default()).unwrap();
        assert_eq!(closed.count_value(0.0), 25);
        assert_eq!(closed.get_pixel(10, 10).unwrap(), 100.0);

        let hat = reconstruction_black_hat(&src, &sel, 1).unwrap();
        assert_eq!(hat.get_pixel(10, 10).unwrap(), 100.0);
        assert_eq!(hat.count_value(0.0), 143);
    }

    #[test]
    fn test_geodesic_size_mismatch() {
        let seed = FPix::new(4, 4).unwrap();
        let mask = FPix::new(5, 4).unwrap();
        assert!(matches!(
            geodesic_erode(&seed, &mask, &ReconstructOptions::default()),
            Err(ReconError::DimensionMismatch { .. })
        ));
    }
}
