//! Block-local shared memory
//!
//! A [`SharedTile`] holds one tile of a [`DeviceGrid`] plus a halo around it.
//! Every stencil kernel loads its tile once, then all threads of the block
//! read their neighborhoods from the copy.

use super::grid::DeviceGrid;
use super::launch::Block2d;

/// Tile-plus-halo snapshot of a device grid
#[derive(Debug, Clone)]
pub struct SharedTile {
    x0: i32,
    y0: i32,
    stride: usize,
    rows: usize,
    data: Vec<f32>,
}

impl SharedTile {
    /// Load the tile of `block` with `halo_x` / `halo_y` extra pixels on
    /// each side. Cells outside the grid read as `sentinel`.
    pub fn load(
        src: &DeviceGrid,
        block: &Block2d,
        halo_x: u32,
        halo_y: u32,
        sentinel: f32,
    ) -> Self {
        let (ox, oy) = block.origin();
        let x0 = ox as i32 - halo_x as i32;
        let y0 = oy as i32 - halo_y as i32;
        let stride = (block.tile + 2 * halo_x) as usize;
        let rows = (block.tile + 2 * halo_y) as usize;

        let mut data = Vec::with_capacity(stride * rows);
        for ly in 0..rows as i32 {
            for lx in 0..stride as i32 {
                data.push(src.guarded_load(x0 + lx, y0 + ly, sentinel));
            }
        }

        SharedTile {
            x0,
            y0,
            stride,
            rows,
            data,
        }
    }

    /// Read the loaded value at global coordinate (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) lies outside the tile-plus-halo window.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f32 {
        let lx = (x - self.x0) as usize;
        let ly = (y - self.y0) as usize;
        assert!(lx < self.stride && ly < self.rows, "read outside shared tile");
        self.data[ly * self.stride + lx]
    }
}
