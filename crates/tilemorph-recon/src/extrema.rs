//! Regional extrema
//!
//! A regional maximum is a connected plateau whose neighbors are all lower.
//! It is found by reconstructing `src` under `src + 1`: the reconstruction
//! raises every pixel that is connected to something higher and leaves the
//! plateaus of the regional maxima untouched. Regional minima are the dual.
//!
//! The one-step offset assumes integer-valued images such as 8-bit data
//! stored as `f32`. On data with finer steps, apply
//! [`remove_low_contrast_basins`] first.

use tilemorph_core::FPix;

use crate::connectivity::Connectivity;
use crate::error::{ReconError, ReconResult};
use crate::reconstruct::{ReconstructOptions, reconstruct};
use crate::stencil::Direction;

/// Output value of a pixel that belongs to a regional extremum
const MARK: f32 = 255.0;

/// Mark the regional maxima of `src`.
///
/// Returns a 0/255 image. Pixels at or above 255 are always marked.
pub fn regional_maxima(src: &FPix, connectivity: Connectivity) -> ReconResult<FPix> {
    let ceiling = src.map(|v| v + 1.0);
    let mut recon = src.clone();
    reconstruct(
        &mut recon,
        &ceiling,
        Direction::Dilate,
        &ReconstructOptions::new(connectivity),
    )?;

    let raised = ceiling.zip_map(&recon, |c, r| c - r)?;
    Ok(raised.zip_map(src, |g, f| {
        if g >= 1.0 || f >= MARK { MARK } else { 0.0 }
    })?)
}

/// Mark the regional minima of `src`.
///
/// Returns a 0/255 image. Pixels equal to 0 are always marked.
pub fn regional_minima(src: &FPix, connectivity: Connectivity) -> ReconResult<FPix> {
    let floor = src.map(|v| v - 1.0);
    let mut recon = src.clone();
    reconstruct(
        &mut recon,
        &floor,
        Direction::Erode,
        &ReconstructOptions::new(connectivity),
    )?;

    let lowered = recon.zip_map(&floor, |r, f| r - f)?;
    Ok(lowered.zip_map(src, |g, f| {
        if g >= 1.0 || f == 0.0 { MARK } else { 0.0 }
    })?)
}

/// Fill every basin shallower than `h`.
///
/// Reconstructs `src + h` by erosion above `src`. Basins whose depth is at
/// most `h` are raised to their rim; deeper ones are raised by `h`.
///
/// # Errors
///
/// Returns `ReconError::InvalidParameters` if `h` is negative or not finite.
pub fn remove_low_contrast_basins(
    src: &FPix,
    h: f32,
    connectivity: Connectivity,
) -> ReconResult<FPix> {
    if !h.is_finite() || h < 0.0 {
        return Err(ReconError::InvalidParameters(format!(
            "basin depth must be finite and >= 0, got {h}"
        )));
    }
    let mut work = src.map(|v| v + h);
    reconstruct(
        &mut work,
        src,
        Direction::Erode,
        &ReconstructOptions::new(connectivity),
    )?;
    Ok(work)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_maxima_row() {
        let src = FPix::from_rows(&[[1.0, 3.0, 3.0, 2.0, 5.0, 0.0]]).unwrap();
        let out = regional_maxima(&src, Connectivity::EightWay).unwrap();
        assert_eq!(out.row(0), &[0.0, 255.0, 255.0, 0.0, 255.0, 0.0]);
    }

    #[test]
    fn test_regional_maxima_saturated() {
        let src = FPix::from_rows(&[[255.0, 300.0, 10.0]]).unwrap();
        let out = regional_maxima(&src, Connectivity::FourWay).unwrap();
        assert_eq!(out.row(0), &[255.0, 255.0, 0.0]);
    }

    #[test]
    fn test_regional_minima_row() {
        let src = FPix::from_rows(&[[4.0, 1.0, 1.0, 2.0, 0.0, 3.0]]).unwrap();
        let out = regional_minima(&src, Connectivity::EightWay).unwrap();
        assert_eq!(out.row(0), &[0.0, 255.0, 255.0, 0.0, 255.0, 0.0]);
    }

    #[test]
    fn test_maxima_connectivity() {
        // The 4 touches the 5 only diagonally
        let src = FPix::from_rows(&[[5.0, 0.0], [0.0, 4.0]]).unwrap();
        let four = regional_maxima(&src, Connectivity::FourWay).unwrap();
        let eight = regional_maxima(&src, Connectivity::EightWay).unwrap();
        assert_eq!(four.get_pixel(1, 1).unwrap(), 255.0);
        assert_eq!(eight.get_pixel(1, 1).unwrap(), 0.0);
        assert_eq!(eight.get_pixel(0, 0).unwrap(), 255.0);
    }

    #[test]
    fn test_remove_low_contrast_basins() {
        let src = FPix::from_rows(&[[5.0, 3.0, 5.0, 5.0, 1.0, 5.0]]).unwrap();
        let out = remove_low_contrast_basins(&src, 2.0, Connectivity::FourWay).unwrap();
        assert_eq!(out.row(0), &[5.0, 5.0, 5.0, 5.0, 3.0, 5.0]);

        assert!(remove_low_contrast_basins(&src, -1.0, Connectivity::FourWay).is_err());
    }
}
