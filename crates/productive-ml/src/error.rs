//! Error types for productive-ml

use thiserror::Error;

/// Result type alias for productive-ml operations
pub type Result<T> = std::result::Result<T, MlError>;

/// Main error type for productive-ml
#[derive(Error, Debug)]
pub enum MlError {
    /// Input or target width does not match a model's declared width
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Where the mismatch was detected
        context: String,
        /// Expected width
        expected: usize,
        /// Actual width
        actual: usize,
    },

    /// Fewer buffered samples than a training request needs
    #[error("Insufficient data: {available} samples available, {required} required")]
    InsufficientData {
        /// Samples currently available
        available: usize,
        /// Samples required
        required: usize,
    },

    /// External telemetry fetch failed
    #[error("Telemetry source error: {0}")]
    TelemetrySource(String),

    /// A computed value left the finite range
    #[error("Numeric instability: {0}")]
    NumericInstability(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Parameter feedback sink rejected an update
    #[error("Parameter sink error: {0}")]
    ParameterSink(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MlError {
    /// Shorthand for a [`MlError::DimensionMismatch`]
    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

impl From<serde_json::Error> for MlError {
    fn from(err: serde_json::Error) -> Self {
        MlError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for MlError {
    fn from(err: toml::de::Error) -> Self {
        MlError::Config(err.to_string())
    }
}
