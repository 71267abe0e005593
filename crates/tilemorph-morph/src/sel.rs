//! Structuring Element (SEL) for morphological operations
//!
//! A structuring element defines the neighborhood used by the flat grayscale
//! stencils. Only `Hit` positions take part in a dilation or erosion.

use crate::{MorphError, MorphResult};

/// Element type in a structuring element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SelElement {
    /// Don't care - this position is ignored
    #[default]
    DontCare = 0,
    /// Hit - part of the neighborhood
    Hit = 1,
    /// Miss - must match background
    Miss = 2,
}

/// Structuring Element (SEL)
///
/// Defines the neighborhood pattern for morphological operations.
/// The origin (cx, cy) is the reference point for the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sel {
    width: u32,
    height: u32,
    cx: u32,
    cy: u32,
    data: Vec<SelElement>,
}

impl Sel {
    /// Create a new structuring element of don't-care elements, with the
    /// origin at the center.
    ///
    /// # Errors
    ///
    /// Returns `MorphError::InvalidSel` if width or height is 0.
    pub fn new(width: u32, height: u32) -> MorphResult<Self> {
        if width == 0 || height == 0 {
            return Err(MorphError::InvalidSel(format!(
                "size must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Sel {
            width,
            height,
            cx: width / 2,
            cy: height / 2,
            data: vec![SelElement::DontCare; (width as usize) * (height as usize)],
        })
    }

    /// Create a rectangular "brick" structuring element with all hits
    pub fn create_brick(width: u32, height: u32) -> MorphResult<Self> {
        let mut sel = Self::new(width, height)?;
        sel.data.fill(SelElement::Hit);
        Ok(sel)
    }

    /// Create a square structuring element with all hits
    pub fn create_square(size: u32) -> MorphResult<Self> {
        Self::create_brick(size, size)
    }

    /// Create a horizontal line structuring element
    pub fn create_horizontal(length: u32) -> MorphResult<Self> {
        Self::create_brick(length, 1)
    }

    /// Create a vertical line structuring element
    pub fn create_vertical(length: u32) -> MorphResult<Self> {
        Self::create_brick(1, length)
    }

    /// Create a cross (+) structuring element of odd `size`
    ///
    /// `create_cross(3)` is the 4-connected neighborhood including the center.
    pub fn create_cross(size: u32) -> MorphResult<Self> {
        if size % 2 == 0 {
            return Err(MorphError::InvalidSel(format!(
                "cross size must be odd, got {}",
                size
            )));
        }
        let mut sel = Self::new(size, size)?;
        let c = size / 2;
        for i in 0..size {
            sel.set_element(c, i, SelElement::Hit);
            sel.set_element(i, c, SelElement::Hit);
        }
        Ok(sel)
    }

    /// Create a structuring element from a string pattern
    ///
    /// # Arguments
    /// * `pattern` - Rows separated by newlines; 'x' for hit, 'o' for miss,
    ///   '.' for don't care. Leading and trailing whitespace on each row is
    ///   ignored, as are blank rows.
    /// * `origin_x` - X coordinate of origin
    /// * `origin_y` - Y coordinate of origin
    pub fn from_string(pattern: &str, origin_x: u32, origin_y: u32) -> MorphResult<Self> {
        let rows: Vec<&str> = pattern
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as u32;

        let mut sel = Self::new(width, height)?;
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() as u32 != width {
                return Err(MorphError::InvalidSel(format!(
                    "row {} has length {}, expected {}",
                    y,
                    row.chars().count(),
                    width
                )));
            }
            for (x, ch) in row.chars().enumerate() {
                let elem = match ch {
                    'x' | 'X' => SelElement::Hit,
                    'o' | 'O' => SelElement::Miss,
                    '.' => SelElement::DontCare,
                    other => {
                        return Err(MorphError::InvalidSel(format!(
                            "unexpected character '{}'",
                            other
                        )));
                    }
                };
                sel.set_element(x as u32, y as u32, elem);
            }
        }
        sel.set_origin(origin_x, origin_y)?;
        Ok(sel)
    }

    /// Get the width
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the origin x coordinate
    #[inline]
    pub fn origin_x(&self) -> u32 {
        self.cx
    }

    /// Get the origin y coordinate
    #[inline]
    pub fn origin_y(&self) -> u32 {
        self.cy
    }

    /// Set the origin
    ///
    /// # Errors
    ///
    /// Returns `MorphError::InvalidSel` if the origin lies outside the SEL.
    pub fn set_origin(&mut self, cx: u32, cy: u32) -> MorphResult<()> {
        if cx >= self.width || cy >= self.height {
            return Err(MorphError::InvalidSel(format!(
                "origin ({}, {}) outside {}x{}",
                cx, cy, self.width, self.height
            )));
        }
        self.cx = cx;
        self.cy = cy;
        Ok(())
    }

    /// Get an element at (x, y)
    #[inline]
    pub fn get_element(&self, x: u32, y: u32) -> Option<SelElement> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[(y * self.width + x) as usize])
    }

    /// Set an element at (x, y). Out-of-range coordinates are ignored.
    #[inline]
    pub fn set_element(&mut self, x: u32, y: u32, elem: SelElement) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = elem;
        }
    }

    /// Get raw element data
    pub fn data(&self) -> &[SelElement] {
        &self.data
    }

    /// Count the number of hit elements
    pub fn hit_count(&self) -> usize {
        self.data.iter().filter(|&&e| e == SelElement::Hit).count()
    }

    /// Count the number of miss elements
    pub fn miss_count(&self) -> usize {
        self.data.iter().filter(|&&e| e == SelElement::Miss).count()
    }

    /// Create the reflected (180-degree rotated) SEL
    pub fn reflect(&self) -> Self {
        let mut data = self.data.clone();
        data.reverse();
        Sel {
            width: self.width,
            height: self.height,
            cx: self.width - 1 - self.cx,
            cy: self.height - 1 - self.cy,
            data,
        }
    }

    /// Iterate over hit positions relative to origin
    pub fn hit_offsets(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let cx = self.cx as i32;
        let cy = self.cy as i32;
        let width = self.width;

        self.data
            .iter()
            .enumerate()
            .filter_map(move |(idx, &elem)| {
                if elem == SelElement::Hit {
                    let x = (idx as u32 % width) as i32;
                    let y = (idx as u32 / width) as i32;
                    Some((x - cx, y - cy))
                } else {
                    None
                }
            })
    }

    /// Largest horizontal and vertical distance of a hit from the origin
    ///
    /// This is the halo a tiled stencil must load around each tile.
    pub fn reach(&self) -> (u32, u32) {
        self.hit_offsets().fold((0, 0), |(rx, ry), (dx, dy)| {
            (rx.max(dx.unsigned_abs()), ry.max(dy.unsigned_abs()))
        })
    }
}
