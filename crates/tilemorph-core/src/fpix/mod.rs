//! FPix - Floating-point image
//!
//! `FPix` is a 2D array of `f32` values. It is the host-side form of every
//! work, mask and temporary array handled by the kernels: images are uploaded
//! into a [`DeviceGrid`](crate::device::DeviceGrid) before a launch and
//! downloaded back afterwards.
//!
//! # Examples
//!
//! ```
//! use tilemorph_core::FPix;
//!
//! // Create a 100x100 floating-point image
//! let mut fpix = FPix::new(100, 100).unwrap();
//!
//! // Set and get pixel values
//! fpix.set_pixel(10, 20, 0.5).unwrap();
//! assert_eq!(fpix.get_pixel(10, 20).unwrap(), 0.5);
//!
//! // Get statistics
//! let (min_val, min_x, min_y) = fpix.min().unwrap();
//! let (max_val, max_x, max_y) = fpix.max().unwrap();
//! ```

use crate::error::{Error, Result};

/// Floating-point image
///
/// A 2D array of `f32` values, one per pixel.
///
/// # Memory Layout
///
/// Data is stored in row-major order with no padding. The pixel at (x, y)
/// is at index `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct FPix {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Pixel data (row-major, no padding)
    data: Vec<f32>,
}

impl FPix {
    /// Create a new FPix with all pixels set to zero
    ///
    /// # Arguments
    ///
    /// * `width` - Width in pixels (must be > 0)
    /// * `height` - Height in pixels (must be > 0)
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilemorph_core::FPix;
    ///
    /// let fpix = FPix::new(640, 480).unwrap();
    /// assert_eq!(fpix.width(), 640);
    /// assert_eq!(fpix.height(), 480);
    /// ```
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::new_with_value(width, height, 0.0)
    }

    /// Create a new FPix with all pixels set to the specified value
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilemorph_core::FPix;
    ///
    /// let fpix = FPix::new_with_value(100, 100, 0.5).unwrap();
    /// assert_eq!(fpix.get_pixel(50, 50).unwrap(), 0.5);
    /// ```
    pub fn new_with_value(width: u32, height: u32, value: f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }

        let size = (width as usize) * (height as usize);
        Ok(FPix {
            width,
            height,
            data: vec![value; size],
        })
    }

    /// Create a FPix from raw data
    ///
    /// # Arguments
    ///
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `data` - Pixel data in row-major order
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions are invalid or data length doesn't match.
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }

        let expected_size = (width as usize) * (height as usize);
        if data.len() != expected_size {
            return Err(Error::InvalidParameter(format!(
                "data length {} doesn't match {}x{} = {}",
                data.len(),
                width,
                height,
                expected_size
            )));
        }

        Ok(FPix {
            width,
            height,
            data,
        })
    }

    /// Create a FPix from a slice of equally long rows
    ///
    /// Handy for literal fixtures: `rows[y][x]` becomes pixel (x, y).
    ///
    /// # Errors
    ///
    /// Returns an error if there are no rows, a row is empty, or rows differ
    /// in length.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilemorph_core::FPix;
    ///
    /// let fpix = FPix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
    /// assert_eq!(fpix.get_pixel(1, 0).unwrap(), 2.0);
    /// assert_eq!(fpix.get_pixel(0, 1).unwrap(), 3.0);
    /// ```
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.as_ref().len()) as u32;

        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() as u32 != width {
                return Err(Error::InvalidParameter(format!(
                    "row {} has length {}, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            data.extend_from_slice(row);
        }

        Self::from_data(width, height, data)
    }

    /// Get the image width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the image dimensions as (width, height)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels in the image
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.data.len()
    }

    /// Get the pixel value at (x, y)
    ///
    /// # Arguments
    ///
    /// * `x` - X coordinate (column)
    /// * `y` - Y coordinate (row)
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<f32> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + (x as usize),
                len: self.data.len(),
            });
        }

        let idx = (y as usize) * (self.width as usize) + (x as usize);
        Ok(self.data[idx])
    }

    /// Set the pixel value at (x, y)
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: f32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + (x as usize),
                len: self.data.len(),
            });
        }

        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.data[idx] = value;
        Ok(())
    }

    /// Get the pixel value at (x, y) without bounds checking
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> f32 {
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.data[idx]
    }

    /// Set the pixel value at (x, y) without bounds checking
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn set_pixel_unchecked(&mut self, x: u32, y: u32, value: f32) {
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.data[idx] = value;
    }

    /// Get raw access to the pixel data
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get mutable access to the pixel data
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Get a row of pixel data
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[f32] {
        let start = (y as usize) * (self.width as usize);
        let end = start + (self.width as usize);
        &self.data[start..end]
    }

    /// Get a mutable row of pixel data
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [f32] {
        let start = (y as usize) * (self.width as usize);
        let end = start + (self.width as usize);
        &mut self.data[start..end]
    }

    /// Create a template FPix with the same dimensions, zeroed data.
    pub fn create_template(&self) -> FPix {
        FPix {
            width: self.width,
            height: self.height,
            data: vec![0.0; self.data.len()],
        }
    }

    // ========================================================================
    // Arithmetic Operations
    // ========================================================================

    /// Add two FPix images element-wise
    ///
    /// # Errors
    ///
    /// Returns `Error::IncompatibleSizes` if dimensions don't match.
    pub fn add(&self, other: &FPix) -> Result<FPix> {
        self.zip_map(other, |a, b| a + b)
    }

    /// Subtract other FPix from this one element-wise
    ///
    /// # Errors
    ///
    /// Returns `Error::IncompatibleSizes` if dimensions don't match.
    pub fn sub(&self, other: &FPix) -> Result<FPix> {
        self.zip_map(other, |a, b| a - b)
    }

    /// Element-wise maximum of two FPix images
    ///
    /// # Errors
    ///
    /// Returns `Error::IncompatibleSizes` if dimensions don't match.
    pub fn max_with(&self, other: &FPix) -> Result<FPix> {
        self.zip_map(other, f32::max)
    }

    /// Add a constant to all pixels (in-place)
    pub fn add_constant(&mut self, value: f32) {
        for v in &mut self.data {
            *v += value;
        }
    }

    /// Apply `f` to every pixel, producing a new image
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> FPix {
        FPix {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two same-sized images pixel by pixel
    ///
    /// # Errors
    ///
    /// Returns `Error::IncompatibleSizes` if dimensions don't match.
    pub fn zip_map<F: Fn(f32, f32) -> f32>(&self, other: &FPix, f: F) -> Result<FPix> {
        self.check_same_size(other)?;

        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(FPix {
            width: self.width,
            height: self.height,
            data,
        })
    }

    /// Check that two FPix have the same dimensions
    ///
    /// # Errors
    ///
    /// Returns `Error::IncompatibleSizes` if dimensions don't match.
    pub fn check_same_size(&self, other: &FPix) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::IncompatibleSizes(
                self.width,
                self.height,
                other.width,
                other.height,
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Find the minimum value and its location
    ///
    /// Returns `(min_value, x, y)` where (x, y) is the location of the first
    /// occurrence of the minimum value.
    pub fn min(&self) -> Option<(f32, u32, u32)> {
        let (idx, &val) = self
            .data
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))?;
        Some((val, self.x_of(idx), self.y_of(idx)))
    }

    /// Find the minimum value only
    pub fn min_value(&self) -> Option<f32> {
        self.min().map(|(v, _, _)| v)
    }

    /// Find the maximum value and its location
    ///
    /// Returns `(max_value, x, y)` where (x, y) is the location of the first
    /// occurrence of the maximum value.
    pub fn max(&self) -> Option<(f32, u32, u32)> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, &val) in self.data.iter().enumerate() {
            if best.is_none_or(|(_, b)| val > b) {
                best = Some((idx, val));
            }
        }
        let (idx, val) = best?;
        Some((val, self.x_of(idx), self.y_of(idx)))
    }

    /// Find the maximum value only
    pub fn max_value(&self) -> Option<f32> {
        self.max().map(|(v, _, _)| v)
    }

    /// Calculate the sum of all pixel values
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Count the pixels equal to `value`
    pub fn count_value(&self, value: f32) -> usize {
        self.data.iter().filter(|&&v| v == value).count()
    }

    #[inline]
    fn x_of(&self, idx: usize) -> u32 {
        (idx % self.width as usize) as u32
    }

    #[inline]
    fn y_of(&self, idx: usize) -> u32 {
        (idx / self.width as usize) as u32
    }
}
