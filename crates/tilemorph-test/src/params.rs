//! Regression test parameters and operations

use tilemorph_core::FPix;

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Compare results (default)
    #[default]
    Compare,
    /// Compare, and print the images of failed comparisons
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// This structure tracks the state of a regression test, including
/// the test name, current index, mode, and success status.
pub struct RegParams {
    /// Name of the test (e.g., "reconstruct")
    pub test_name: String,
    /// Current test index (incremented before each test)
    index: usize,
    /// Test mode
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// # Arguments
    ///
    /// * `test_name` - Name of the test (e.g., "reconstruct")
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, msg: String) {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
    }

    /// Compare two floating-point values
    ///
    /// # Arguments
    ///
    /// * `expected` - Expected value
    /// * `actual` - Actual computed value
    /// * `delta` - Maximum allowed difference
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        if diff > delta {
            let msg = format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            );
            self.fail(msg);
            false
        } else {
            true
        }
    }

    /// Compare two images for exact equality
    ///
    /// # Returns
    ///
    /// `true` if the images have the same size and bit-identical pixels,
    /// `false` otherwise.
    pub fn compare_fpix(&mut self, expected: &FPix, actual: &FPix) -> bool {
        self.index += 1;

        if expected.dimensions() != actual.dimensions() {
            let msg = format!(
                "Failure in {}_reg: fpix comparison for index {} - dimension mismatch {:?} vs {:?}",
                self.test_name,
                self.index,
                expected.dimensions(),
                actual.dimensions()
            );
            self.fail(msg);
            return false;
        }

        let width = expected.width();
        let mismatch = expected
            .data()
            .iter()
            .zip(actual.data())
            .position(|(a, b)| a.to_bits() != b.to_bits());
        let Some(i) = mismatch else {
            return true;
        };

        let (x, y) = (i as u32 % width, i as u32 / width);
        let msg = format!(
            "Failure in {}_reg: fpix comparison for index {} - pixel mismatch at ({}, {}): expected {}, got {}",
            self.test_name,
            self.index,
            x,
            y,
            expected.data()[i],
            actual.data()[i]
        );
        self.fail(msg);
        if self.display() {
            eprintln!("expected:\n{}", render(expected));
            eprintln!("actual:\n{}", render(actual));
        }
        false
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all tests passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all tests have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

/// Text dump of an image, one row per line
fn render(pix: &FPix) -> String {
    (0..pix.height())
        .map(|y| {
            pix.row(y)
                .iter()
                .map(|v| format!("{v:5}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
