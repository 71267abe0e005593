//! tilemorph-test - Regression test framework for tilemorph
//!
//! This crate provides the support code shared by the `*_reg` tests:
//!
//! - [`RegParams`] - Numbered value and image comparisons with a summary
//! - [`reference_reconstruct`] - Sequential raster-scan reconstruction used
//!   as the oracle
//! - Fixture builders and logger setup
//!
//! # Usage
//!
//! ```ignore
//! use tilemorph_test::RegParams;
//!
//! let mut rp = RegParams::new("reconstruct");
//! rp.compare_values(25.0, count as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" or "display"
//! - `RUST_LOG`: Log filter for [`init_logging`]

mod error;
mod params;
mod reference;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};
pub use reference::{ReferenceOp, reference_reconstruct};

use rand::SeedableRng;
use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use tilemorph_core::FPix;

/// Route `log` output to the test harness.
///
/// Safe to call from every test; only the first call installs the logger.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Image of integer levels in `0..levels`, reproducible from `seed`.
pub fn random_fpix(width: u32, height: u32, levels: u32, seed: u64) -> TestResult<FPix> {
    let dist = Uniform::new(0u32, levels).map_err(|e| TestError::Fixture(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..(width as usize) * (height as usize))
        .map(|_| dist.sample(&mut rng) as f32)
        .collect();
    Ok(FPix::from_data(width, height, data)?)
}

/// Binary image from text rows: `#` is 255, `.` is 0.
///
/// # Examples
///
/// ```
/// let pix = tilemorph_test::binary_fixture(&["#.", ".#"]).unwrap();
/// assert_eq!(pix.get_pixel(1, 1).unwrap(), 255.0);
/// ```
pub fn binary_fixture(rows: &[&str]) -> TestResult<FPix> {
    let rows = rows
        .iter()
        .map(|row| {
            row.chars()
                .map(|c| match c {
                    '#' => Ok(255.0),
                    '.' => Ok(0.0),
                    other => Err(TestError::Fixture(format!("unexpected character '{other}'"))),
                })
                .collect::<TestResult<Vec<f32>>>()
        })
        .collect::<TestResult<Vec<_>>>()?;
    Ok(FPix::from_rows(&rows)?)
}
