//! Device-resident 2D grids
//!
//! A [`DeviceGrid`] is the device-side copy of an [`FPix`]. Cells are `f32`
//! values stored as `AtomicU32` bit patterns so that any number of blocks may
//! read and update them concurrently during a launch.

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::fpix::FPix;

/// A 2D array of `f32` cells shared by every block of a launch
///
/// Plain loads and stores are relaxed; the host only inspects a grid after
/// the launch that wrote it has returned. Single-cell reductions
/// ([`fetch_max`](Self::fetch_max), [`fetch_min`](Self::fetch_min)) are
/// compare-and-swap loops.
#[derive(Debug)]
pub struct DeviceGrid {
    width: u32,
    height: u32,
    cells: Vec<AtomicU32>,
}

impl DeviceGrid {
    /// Allocate a grid with every cell set to `value`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    pub fn filled(width: u32, height: u32, value: f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let len = (width as usize) * (height as usize);
        let bits = value.to_bits();
        Ok(DeviceGrid {
            width,
            height,
            cells: (0..len).map(|_| AtomicU32::new(bits)).collect(),
        })
    }

    /// Allocate a zeroed grid.
    pub fn zeroed(width: u32, height: u32) -> Result<Self> {
        Self::filled(width, height, 0.0)
    }

    /// Copy a host image into a new device grid.
    pub fn upload(src: &FPix) -> Self {
        DeviceGrid {
            width: src.width(),
            height: src.height(),
            cells: src
                .data()
                .iter()
                .map(|v| AtomicU32::new(v.to_bits()))
                .collect(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True if the signed coordinate lies inside the grid.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn cell(&self, x: u32, y: u32) -> &AtomicU32 {
        &self.cells[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Read the cell at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the grid.
    #[inline]
    pub fn load(&self, x: u32, y: u32) -> f32 {
        f32::from_bits(self.cell(x, y).load(Ordering::Relaxed))
    }

    /// Write the cell at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the grid.
    #[inline]
    pub fn store(&self, x: u32, y: u32, value: f32) {
        self.cell(x, y).store(value.to_bits(), Ordering::Relaxed);
    }

    /// Read the cell at (x, y), or `sentinel` if the coordinate is outside
    /// the grid.
    #[inline]
    pub fn guarded_load(&self, x: i32, y: i32, sentinel: f32) -> f32 {
        if self.contains(x, y) {
            self.load(x as u32, y as u32)
        } else {
            sentinel
        }
    }

    /// Atomically raise the cell to `value` if `value` is larger.
    ///
    /// Returns the previous cell value.
    pub fn fetch_max(&self, x: u32, y: u32, value: f32) -> f32 {
        self.fetch_update_if(x, y, |cur| value > cur, value)
    }

    /// Atomically lower the cell to `value` if `value` is smaller.
    ///
    /// Returns the previous cell value.
    pub fn fetch_min(&self, x: u32, y: u32, value: f32) -> f32 {
        self.fetch_update_if(x, y, |cur| value < cur, value)
    }

    /// Atomically replace `current` with `new`.
    ///
    /// On failure returns the value actually found in the cell. Comparison is
    /// on bit patterns, so `0.0` and `-0.0` are distinct.
    pub fn compare_exchange(
        &self,
        x: u32,
        y: u32,
        current: f32,
        new: f32,
    ) -> std::result::Result<f32, f32> {
        self.cell(x, y)
            .compare_exchange(
                current.to_bits(),
                new.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(f32::from_bits)
            .map_err(f32::from_bits)
    }

    fn fetch_update_if<P: Fn(f32) -> bool>(&self, x: u32, y: u32, wins: P, value: f32) -> f32 {
        let prev = self
            .cell(x, y)
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                wins(f32::from_bits(bits)).then_some(value.to_bits())
            });
        match prev {
            Ok(bits) | Err(bits) => f32::from_bits(bits),
        }
    }

    /// Device-to-device copy of a same-sized grid.
    ///
    /// # Errors
    ///
    /// Returns `Error::IncompatibleSizes` if dimensions don't match.
    pub fn copy_from(&self, src: &DeviceGrid) -> Result<()> {
        self.check_same_size(src)?;
        self.cells
            .par_iter()
            .zip(src.cells.par_iter())
            .for_each(|(dst, s)| dst.store(s.load(Ordering::Relaxed), Ordering::Relaxed));
        Ok(())
    }

    /// Check that two grids have the same dimensions.
    pub fn check_same_size(&self, other: &DeviceGrid) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::IncompatibleSizes(
                self.width,
                self.height,
                other.width,
                other.height,
            ));
        }
        Ok(())
    }

    /// Copy the grid back into a new host image.
    pub fn download(&self) -> Result<FPix> {
        let mut out = FPix::new(self.width, self.height)?;
        self.write_into(out.data_mut());
        Ok(out)
    }

    /// Copy the grid back into an existing host image.
    ///
    /// # Errors
    ///
    /// Returns `Error::IncompatibleSizes` if dimensions don't match.
    pub fn download_into(&self, dst: &mut FPix) -> Result<()> {
        if dst.dimensions() != self.dimensions() {
            return Err(Error::IncompatibleSizes(
                self.width,
                self.height,
                dst.width(),
                dst.height(),
            ));
        }
        self.write_into(dst.data_mut());
        Ok(())
    }

    fn write_into(&self, out: &mut [f32]) {
        for (dst, cell) in out.iter_mut().zip(self.cells.iter()) {
            *dst = f32::from_bits(cell.load(Ordering::Relaxed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_upload_download() {
        let src = FPix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let grid = DeviceGrid::upload(&src);
        assert_eq!(grid.dimensions(), (3, 2));
        assert_eq!(grid.load(2, 1), 6.0);
        assert_eq!(grid.download().unwrap(), src);
    }

    #[test]
    fn test_grid_guarded_load() {
        let grid = DeviceGrid::filled(4, 4, 7.0).unwrap();
        assert_eq!(grid.guarded_load(0, 0, -1.0), 7.0);
        assert_eq!(grid.guarded_load(-1, 0, -1.0), -1.0);
        assert_eq!(grid.guarded_load(0, 4, f32::MAX), f32::MAX);
        assert!(!grid.contains(4, 3));
    }

    #[test]
    fn test_grid_fetch_extrema() {
        let grid = DeviceGrid::filled(2, 2, 5.0).unwrap();
        assert_eq!(grid.fetch_max(0, 0, 3.0), 5.0);
        assert_eq!(grid.load(0, 0), 5.0);
        assert_eq!(grid.fetch_max(0, 0, 9.0), 5.0);
        assert_eq!(grid.load(0, 0), 9.0);

        assert_eq!(grid.fetch_min(1, 1, 8.0), 5.0);
        assert_eq!(grid.load(1, 1), 5.0);
        assert_eq!(grid.fetch_min(1, 1, -2.0), 5.0);
        assert_eq!(grid.load(1, 1), -2.0);
    }

    #[test]
    fn test_grid_compare_exchange() {
        let grid = DeviceGrid::zeroed(2, 1).unwrap();
        assert_eq!(grid.compare_exchange(1, 0, 0.0, 255.0), Ok(0.0));
        assert_eq!(grid.compare_exchange(1, 0, 0.0, 255.0), Err(255.0));
    }

    #[test]
    fn test_grid_copy_from() {
        let a = DeviceGrid::zeroed(3, 3).unwrap();
        let b = DeviceGrid::filled(3, 3, 1.0).unwrap();
        a.copy_from(&b).unwrap();
        assert_eq!(a.load(2, 2), 1.0);

        let c = DeviceGrid::zeroed(3, 4).unwrap();
        assert!(a.copy_from(&c).is_err());
        assert!(DeviceGrid::zeroed(0, 1).is_err());
    }
}
