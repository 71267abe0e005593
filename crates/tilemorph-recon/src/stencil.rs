//! Extremum stencil ops
//!
//! A stencil op computes the maximum (dilation) or minimum (erosion) over a
//! pixel and its neighbors. The bulk, extraction and propagation kernels are
//! generic over [`ExtremumOp`], so a custom op plugs into all three at once.

use tilemorph_core::{DeviceGrid, SharedTile};

use crate::connectivity::Connectivity;
use crate::error::{ReconError, ReconResult};

/// Which way a reconstruction moves values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Reconstruction by dilation; the mask is a ceiling
    Dilate,
    /// Reconstruction by erosion; the mask is a floor
    Erode,
}

impl Direction {
    /// Value read for pixels outside the image. It never wins the extremum.
    #[inline]
    pub fn sentinel(self) -> f32 {
        match self {
            Direction::Dilate => -f32::MAX,
            Direction::Erode => f32::MAX,
        }
    }

    #[inline]
    pub fn extremum(self, a: f32, b: f32) -> f32 {
        match self {
            Direction::Dilate => a.max(b),
            Direction::Erode => a.min(b),
        }
    }

    /// Bound `value` by the mask on the relevant side.
    #[inline]
    pub fn clip(self, value: f32, mask: f32) -> f32 {
        match self {
            Direction::Dilate => value.min(mask),
            Direction::Erode => value.max(mask),
        }
    }

    /// True if `new` moves past `old` in this direction.
    #[inline]
    pub fn improves(self, new: f32, old: f32) -> bool {
        match self {
            Direction::Dilate => new > old,
            Direction::Erode => new < old,
        }
    }

    /// Atomically move the cell at (x, y) towards `value`.
    ///
    /// Returns true if this call changed the cell.
    #[inline]
    pub fn commit(self, grid: &DeviceGrid, x: u32, y: u32, value: f32) -> bool {
        let prev = match self {
            Direction::Dilate => grid.fetch_max(x, y, value),
            Direction::Erode => grid.fetch_min(x, y, value),
        };
        self.improves(value, prev)
    }
}

/// The 3x3 neighborhood of one pixel, indexed `[dy + 1][dx + 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighborhood {
    values: [[f32; 3]; 3],
}

impl Neighborhood {
    /// Build a neighborhood from a reader of offsets (dx, dy).
    #[inline]
    pub fn gather<F: Fn(i32, i32) -> f32>(read: F) -> Self {
        let mut values = [[0.0; 3]; 3];
        for (dy, row) in (-1..=1).zip(values.iter_mut()) {
            for (dx, v) in (-1..=1).zip(row.iter_mut()) {
                *v = read(dx, dy);
            }
        }
        Neighborhood { values }
    }

    /// Neighborhood of (x, y) from a block's shared tile.
    #[inline]
    pub fn from_tile(tile: &SharedTile, x: u32, y: u32) -> Self {
        Self::gather(|dx, dy| tile.get(x as i32 + dx, y as i32 + dy))
    }

    /// Neighborhood of (x, y) read straight from device memory.
    #[inline]
    pub fn from_grid(grid: &DeviceGrid, x: u32, y: u32, sentinel: f32) -> Self {
        Self::gather(|dx, dy| grid.guarded_load(x as i32 + dx, y as i32 + dy, sentinel))
    }

    /// Value at offset (dx, dy), each in -1..=1
    #[inline]
    pub fn at(&self, dx: i32, dy: i32) -> f32 {
        self.values[(dy + 1) as usize][(dx + 1) as usize]
    }

    #[inline]
    pub fn center(&self) -> f32 {
        self.values[1][1]
    }
}

/// A max/min functor over a 3x3 neighborhood
///
/// `offsets` must be exactly the neighbor set of `connectivity`; the
/// propagation kernel enqueues along `connectivity`, so any other set would
/// make "neighbor" mean different things in different kernels.
pub trait ExtremumOp: Sync {
    fn direction(&self) -> Direction;

    fn connectivity(&self) -> Connectivity;

    /// Neighbor offsets the op reads, center excluded
    fn offsets(&self) -> &[(i32, i32)] {
        self.connectivity().offsets()
    }

    /// Extremum over the center and the op's neighbors.
    fn compute(&self, n: &Neighborhood) -> f32 {
        let dir = self.direction();
        self.offsets()
            .iter()
            .fold(n.center(), |acc, &(dx, dy)| dir.extremum(acc, n.at(dx, dy)))
    }
}

/// The standard 4- or 8-connected extremum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extremum {
    direction: Direction,
    connectivity: Connectivity,
}

impl Extremum {
    pub fn new(direction: Direction, connectivity: Connectivity) -> Self {
        Extremum {
            direction,
            connectivity,
        }
    }

    /// Max over the neighborhood
    pub fn dilate(connectivity: Connectivity) -> Self {
        Self::new(Direction::Dilate, connectivity)
    }

    /// Min over the neighborhood
    pub fn erode(connectivity: Connectivity) -> Self {
        Self::new(Direction::Erode, connectivity)
    }
}

impl ExtremumOp for Extremum {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn connectivity(&self) -> Connectivity {
        self.connectivity
    }
}

/// Check that an op's offset set matches its declared connectivity.
///
/// # Errors
///
/// Returns `ReconError::ConnectivityMismatch` if the sets differ.
pub fn validate_op<O: ExtremumOp + ?Sized>(op: &O) -> ReconResult<()> {
    let declared = op.connectivity();
    let offsets = op.offsets();
    let expected = declared.offsets();

    let same = offsets.len() == expected.len() && expected.iter().all(|o| offsets.contains(o));
    if !same {
        return Err(ReconError::ConnectivityMismatch {
            connectivity: declared,
            offsets: offsets.len(),
        });
    }
    Ok(())
}
