//! tilemorph-recon - Morphological reconstruction engine
//!
//! This crate provides iterative morphological reconstruction on a
//! data-parallel tiled device model, and the operators built on it:
//!
//! - **Reconstruction** - Repeated clipped dilation or erosion of a marker
//!   under a mask until nothing changes, by full-grid bulk passes or by a
//!   seed worklist
//! - **Geodesic operators** - Opening and closing by reconstruction and the
//!   matching top-hat and black-hat
//! - **Fills** - Hole filling and removal of border-touching components
//! - **Regional extrema** - Regional maxima and minima, basin flattening
//! - **Pruning** - Spur removal on binary skeletons
//!
//! # Examples
//!
//! ## Reconstruction by dilation
//!
//! ```
//! use tilemorph_core::FPix;
//! use tilemorph_recon::{Connectivity, Direction, ReconstructOptions, reconstruct};
//!
//! // A wall of 0 splits the mask in two halves
//! let mask = FPix::from_rows(&[
//!     [10.0, 10.0, 0.0, 10.0],
//!     [10.0, 10.0, 0.0, 10.0],
//! ])
//! .unwrap();
//! let mut work = FPix::new(4, 2).unwrap();
//! work.set_pixel(0, 0, 10.0).unwrap();
//!
//! let options = ReconstructOptions::new(Connectivity::FourWay);
//! let stats = reconstruct(&mut work, &mask, Direction::Dilate, &options).unwrap();
//! assert!(stats.converged);
//! assert_eq!(work.count_value(10.0), 4);
//! assert_eq!(work.get_pixel(3, 0).unwrap(), 0.0);
//! ```
//!
//! ## Hole filling
//!
//! ```
//! use tilemorph_core::FPix;
//! use tilemorph_recon::{Connectivity, fill_holes};
//!
//! let ring = FPix::from_rows(&[
//!     [255.0, 255.0, 255.0],
//!     [255.0, 0.0, 255.0],
//!     [255.0, 255.0, 255.0],
//! ])
//! .unwrap();
//! let filled = fill_holes(&ring, Connectivity::FourWay).unwrap();
//! assert_eq!(filled.count_value(255.0), 9);
//! ```

pub mod connectivity;
pub mod error;
pub mod extrema;
pub mod fill;
pub mod geodesic;
pub mod kernels;
pub mod pruning;
pub mod reconstruct;
pub mod seeds;
pub mod stencil;

// Re-export core types
pub use tilemorph_core;

// Re-export error types
pub use error::{ReconError, ReconResult};

pub use connectivity::Connectivity;
pub use stencil::{Direction, Extremum, ExtremumOp, Neighborhood};

// Re-export the orchestrator
pub use reconstruct::{
    ReconstructOptions, ReconstructStats, Reconstructor, Strategy, reconstruct, reconstruct_with,
};

// Re-export operators
pub use extrema::{regional_maxima, regional_minima, remove_low_contrast_basins};
pub use fill::{delete_border_components, fill_background_from_border, fill_holes};
pub use geodesic::{
    geodesic_close, geodesic_dilate, geodesic_erode, geodesic_open, reconstruction_black_hat,
    reconstruction_top_hat,
};
pub use pruning::prune;
