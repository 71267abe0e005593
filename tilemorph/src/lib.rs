//! tilemorph - Tiled data-parallel morphology for Rust
//!
//! tilemorph computes morphological reconstruction (repeated clipped
//! dilation or erosion until convergence) on `f32` images, running every
//! step as a tiled, block-parallel kernel launch.
//!
//! # Overview
//!
//! - Reconstruction by dilation and erosion, bulk or worklist driven
//! - Geodesic opening and closing, reconstruction top-hat and black-hat
//! - Hole filling and border-component removal
//! - Regional maxima and minima, basin flattening, skeleton pruning
//! - Flat structuring-element grayscale morphology
//!
//! # Example
//!
//! ```
//! use tilemorph::FPix;
//! use tilemorph::recon::{Direction, ReconstructOptions, reconstruct};
//!
//! let mut work = FPix::new(8, 8).unwrap();
//! work.set_pixel(0, 0, 1.0).unwrap();
//! let mask = FPix::new_with_value(8, 8, 1.0).unwrap();
//!
//! reconstruct(&mut work, &mask, Direction::Dilate, &ReconstructOptions::default()).unwrap();
//! assert_eq!(work.count_value(1.0), 64);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use tilemorph_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use tilemorph_morph as morph;
pub use tilemorph_recon as recon;
