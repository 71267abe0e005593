//! tilemorph-morph - Flat grayscale morphology
//!
//! This crate provides the single-pass stencil operators used around the
//! reconstruction engine:
//!
//! - Structuring elements (SEL) for defining operation neighborhoods
//! - Grayscale morphology: erosion, dilation, opening, closing for `f32` images
//! - Morphological gradient, top-hat, and bottom-hat transforms

mod error;
pub mod grayscale;
pub mod sel;

pub use error::{MorphError, MorphResult};
pub use sel::{Sel, SelElement};

pub use grayscale::{
    GRAY_TILE_SIZE, bottom_hat_gray, close_gray, dilate_gray, erode_gray, gradient_gray,
    open_gray, top_hat_gray,
};
