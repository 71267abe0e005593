//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur during regression testing
#[derive(Debug, Error)]
pub enum TestError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] tilemorph_core::Error),

    /// A fixture could not be built
    #[error("invalid fixture: {0}")]
    Fixture(String),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
