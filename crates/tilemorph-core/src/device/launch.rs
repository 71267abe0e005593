//! Kernel launches
//!
//! A launch runs a kernel closure once per block of a grid. Blocks share no
//! state except device memory and are dispatched in parallel with rayon;
//! `launch` returns only after every block has finished, which is the
//! host-side serialization point between two launches.
//!
//! Inside a block the kernel walks its threads itself. A block-wide barrier
//! is simply the boundary between two such walks.

use rayon::prelude::*;

use crate::error::{Error, Result};

/// Integer division rounding up.
#[inline]
pub fn div_up(n: usize, d: usize) -> usize {
    n.div_ceil(d)
}

// ============================================================================
// 2D tiled launches
// ============================================================================

/// A padded 2D grid of square tiles covering a `width x height` extent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid2d {
    width: u32,
    height: u32,
    tile: u32,
    blocks_x: u32,
    blocks_y: u32,
}

/// One block of a [`Grid2d`] launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block2d {
    /// Tile column
    pub block_x: u32,
    /// Tile row
    pub block_y: u32,
    /// Row-major block index, used to address per-block outputs
    pub linear: usize,
    /// Tile edge length
    pub tile: u32,
    width: u32,
    height: u32,
}

impl Grid2d {
    /// Build the tile grid for an extent.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` for an empty extent and
    /// `Error::InvalidLaunch` for a zero tile size.
    pub fn new(width: u32, height: u32, tile: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        if tile == 0 {
            return Err(Error::InvalidLaunch("tile size must be > 0".to_string()));
        }
        Ok(Grid2d {
            width,
            height,
            tile,
            blocks_x: width.div_ceil(tile),
            blocks_y: height.div_ceil(tile),
        })
    }

    /// Number of tiles along (x, y)
    pub fn blocks(&self) -> (u32, u32) {
        (self.blocks_x, self.blocks_y)
    }

    /// Total number of blocks
    pub fn block_count(&self) -> usize {
        (self.blocks_x as usize) * (self.blocks_y as usize)
    }

    pub fn tile(&self) -> u32 {
        self.tile
    }

    /// Describe block `linear`.
    pub fn block(&self, linear: usize) -> Block2d {
        Block2d {
            block_x: (linear % self.blocks_x as usize) as u32,
            block_y: (linear / self.blocks_x as usize) as u32,
            linear,
            tile: self.tile,
            width: self.width,
            height: self.height,
        }
    }

    /// Run `kernel` once for every block.
    pub fn launch<F>(&self, kernel: F)
    where
        F: Fn(Block2d) + Sync + Send,
    {
        (0..self.block_count())
            .into_par_iter()
            .for_each(|b| kernel(self.block(b)));
    }
}

impl Block2d {
    /// Global coordinate of the tile's top-left pixel
    #[inline]
    pub fn origin(&self) -> (u32, u32) {
        (self.block_x * self.tile, self.block_y * self.tile)
    }

    /// Threads per block (`tile * tile`)
    #[inline]
    pub fn thread_count(&self) -> usize {
        (self.tile as usize) * (self.tile as usize)
    }

    /// Pixel handled by thread `thread`, or `None` if that thread falls in
    /// the padding beyond the image extent.
    #[inline]
    pub fn pixel(&self, thread: usize) -> Option<(u32, u32)> {
        let (ox, oy) = self.origin();
        let x = ox + (thread % self.tile as usize) as u32;
        let y = oy + (thread / self.tile as usize) as u32;
        (x < self.width && y < self.height).then_some((x, y))
    }
}

// ============================================================================
// 1D launches
// ============================================================================

/// A 1D grid of fixed-size blocks covering `len` work items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid1d {
    len: usize,
    block_dim: usize,
}

/// One block of a [`Grid1d`] launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block1d {
    /// Block index
    pub index: usize,
    /// Threads per block
    pub block_dim: usize,
    len: usize,
}

impl Grid1d {
    /// Build a 1D grid. An empty grid (`len == 0`) launches no blocks.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLaunch` for a zero block size.
    pub fn new(len: usize, block_dim: usize) -> Result<Self> {
        if block_dim == 0 {
            return Err(Error::InvalidLaunch("block size must be > 0".to_string()));
        }
        Ok(Grid1d { len, block_dim })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn block_count(&self) -> usize {
        div_up(self.len, self.block_dim)
    }

    /// Run `kernel` once for every block.
    pub fn launch<F>(&self, kernel: F)
    where
        F: Fn(Block1d) + Sync + Send,
    {
        (0..self.block_count()).into_par_iter().for_each(|index| {
            kernel(Block1d {
                index,
                block_dim: self.block_dim,
                len: self.len,
            })
        });
    }
}

impl Block1d {
    /// Global work item of thread `thread`, or `None` past the end.
    #[inline]
    pub fn item(&self, thread: usize) -> Option<usize> {
        let i = self.index * self.block_dim + thread;
        (thread < self.block_dim && i < self.len).then_some(i)
    }
}
