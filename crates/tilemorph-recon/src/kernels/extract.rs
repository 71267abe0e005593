//! Seed extraction kernels
//!
//! These launches produce the first seed list of a worklist run. Each block
//! buffers its seeds locally and appends them to the global list with one
//! reservation on the seed counter.

use tilemorph_core::{DeviceGrid, SharedTile};

use super::bulk::bulk_grid;
use super::check_extent;
use crate::error::ReconResult;
use crate::seeds::{Seed, SeedCounter, SeedList, append_block};
use crate::stencil::{ExtremumOp, Neighborhood};

/// Full-grid pass from `src` into `dst` that records every changed pixel.
///
/// After the launch `counter` holds exactly the number of pixels whose value
/// changed, and the first that many entries of `seeds` are their
/// coordinates in no particular order. The counter must be reset by the
/// caller beforehand. A list holding one entry per pixel never overflows.
pub fn extract_seeds<O: ExtremumOp>(
    src: &DeviceGrid,
    dst: &DeviceGrid,
    mask: &DeviceGrid,
    op: &O,
    seeds: &SeedList,
    counter: &SeedCounter,
) -> ReconResult<()> {
    check_extent(mask, src)?;
    check_extent(mask, dst)?;
    let grid = bulk_grid(mask)?;
    let dir = op.direction();

    grid.launch(|block| {
        let tile = SharedTile::load(src, &block, 1, 1, dir.sentinel());
        let mut local = Vec::with_capacity(block.thread_count());

        for t in 0..block.thread_count() {
            let Some((x, y)) = block.pixel(t) else {
                continue;
            };
            let n = Neighborhood::from_tile(&tile, x, y);
            let new = dir.clip(op.compute(&n), mask.load(x, y));
            dst.store(x, y, new);
            if new != n.center() {
                local.push(Seed::new(x, y));
            }
        }

        append_block(seeds, counter, &local);
    });
    Ok(())
}

/// Seed a fill from the image border.
///
/// Border pixels whose `src` value is 0 are set to 255 in `marker` and
/// appended to `seeds`; every other pixel of `marker` is set to 0.
pub fn seed_border(
    src: &DeviceGrid,
    marker: &DeviceGrid,
    seeds: &SeedList,
    counter: &SeedCounter,
) -> ReconResult<()> {
    check_extent(src, marker)?;
    let grid = bulk_grid(src)?;
    let (w, h) = src.dimensions();

    grid.launch(|block| {
        let mut local = Vec::new();
        for t in 0..block.thread_count() {
            let Some((x, y)) = block.pixel(t) else {
                continue;
            };
            let on_border = x == 0 || y == 0 || x == w - 1 || y == h - 1;
            if on_border && src.load(x, y) == 0.0 {
                marker.store(x, y, 255.0);
                local.push(Seed::new(x, y));
            } else {
                marker.store(x, y, 0.0);
            }
        }
        append_block(seeds, counter, &local);
    });
    Ok(())
}

/// Upper bound on the number of seeds [`seed_border`] can produce.
pub fn border_pixel_count(width: u32, height: u32) -> usize {
    let (w, h) = (width as usize, height as usize);
    if w <= 2 || h <= 2 {
        w * h
    } else {
        2 * (w + h) - 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::Connectivity;
    use crate::stencil::Extremum;
    use std::collections::HashSet;
    use tilemorph_core::FPix;

    #[test]
    fn test_extract_counts_changed_pixels() {
        // Two sparse seeds in different tiles of a 64x40 grid
        let mut seed = FPix::new(64, 40).unwrap();
        seed.set_pixel(5, 5, 3.0).unwrap();
        seed.set_pixel(50, 35, 3.0).unwrap();
        let src = DeviceGrid::upload(&seed);
        let dst = DeviceGrid::zeroed(64, 40).unwrap();
        let mask = DeviceGrid::filled(64, 40, 3.0).unwrap();

        let seeds = SeedList::with_capacity(64 * 40);
        let counter = SeedCounter::new();
        let op = Extremum::dilate(Connectivity::FourWay);
        extract_seeds(&src, &dst, &mask, &op, &seeds, &counter).unwrap();

        assert_eq!(counter.read_back(), 8);
        assert!(!counter.overflowed());
        let got: HashSet<Seed> = seeds.read_back(8).into_iter().collect();
        let want: HashSet<Seed> = [
            (5, 4),
            (4, 5),
            (6, 5),
            (5, 6),
            (50, 34),
            (49, 35),
            (51, 35),
            (50, 36),
        ]
        .into_iter()
        .map(|(x, y)| Seed::new(x, y))
        .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_extract_converged_is_empty() {
        let flat = DeviceGrid::filled(8, 8, 2.0).unwrap();
        let dst = DeviceGrid::zeroed(8, 8).unwrap();
        let seeds = SeedList::with_capacity(64);
        let counter = SeedCounter::new();
        let op = Extremum::erode(Connectivity::EightWay);
        extract_seeds(&flat, &dst, &flat, &op, &seeds, &counter).unwrap();
        assert_eq!(counter.read_back(), 0);
    }

    #[test]
    fn test_seed_border() {
        let src = FPix::from_rows(&[
            [0.0, 255.0, 0.0],
            [0.0, 0.0, 0.0],
            [255.0, 0.0, 0.0],
        ])
        .unwrap();
        let src = DeviceGrid::upload(&src);
        let marker = DeviceGrid::filled(3, 3, 9.0).unwrap();
        let seeds = SeedList::with_capacity(border_pixel_count(3, 3));
        let counter = SeedCounter::new();
        seed_border(&src, &marker, &seeds, &counter).unwrap();

        assert_eq!(counter.read_back(), 6);
        let out = marker.download().unwrap();
        assert_eq!(out.get_pixel(1, 1).unwrap(), 0.0);
        assert_eq!(out.get_pixel(1, 0).unwrap(), 0.0);
        assert_eq!(out.get_pixel(0, 0).unwrap(), 255.0);
        assert_eq!(out.count_value(255.0), 6);
    }

    #[test]
    fn test_border_pixel_count() {
        assert_eq!(border_pixel_count(7, 7), 24);
        assert_eq!(border_pixel_count(2, 5), 10);
        assert_eq!(border_pixel_count(1, 1), 1);
    }
}
