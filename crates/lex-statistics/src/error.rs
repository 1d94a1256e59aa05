//! Error types for the statistics engine.
//!
//! Errors fall into two groups. Structural errors (a wrong variable type,
//! non-numeric data fed to a numeric algorithm, a missing column) are fatal
//! to the call that raised them. Numerical edge cases (too few observations,
//! unparseable interval labels, zero-variance data) are recoverable: callers
//! such as [`crate::ColumnAnalyzer`] absorb them into per-statistic
//! "not applicable" markers and warnings instead of aborting a whole report.
//!
//! Errors are serializable so a presentation layer can display them.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for statistical computations.
#[derive(Error, Debug)]
pub enum StatsError {
    /// Fewer observations than the algorithm requires.
    #[error("Insufficient data: {required} observation(s) required, {actual} available")]
    InsufficientData { required: usize, actual: usize },

    /// Variable type tag is unknown or inconsistent with the data/table.
    #[error("Invalid variable type: {0}")]
    InvalidVariableType(String),

    /// Malformed interval label or other textual input.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Zero variance, zero IQR or all-equal values.
    #[error("Degenerate distribution: {0}")]
    DegenerateDistribution(String),

    /// A numeric-only algorithm received non-numeric data.
    #[error("Non-numeric data in column '{0}'")]
    NonNumericData(String),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ConfigValidationError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StatsError>,
    },
}

impl StatsError {
    /// Shorthand for [`StatsError::InsufficientData`].
    pub fn insufficient(required: usize, actual: usize) -> Self {
        StatsError::InsufficientData { required, actual }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StatsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::InvalidVariableType(_) => "INVALID_VARIABLE_TYPE",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::DegenerateDistribution(_) => "DEGENERATE_DISTRIBUTION",
            Self::NonNumericData(_) => "NON_NUMERIC_DATA",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a numerical edge case that callers should absorb
    /// into a null/"not applicable" result rather than propagate.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientData { .. }
            | Self::ParseError(_)
            | Self::DegenerateDistribution(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for StatsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("StatsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for statistics operations.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| StatsError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            StatsError::insufficient(4, 2).error_code(),
            "INSUFFICIENT_DATA"
        );
        assert_eq!(
            StatsError::ColumnNotFound("age".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(StatsError::insufficient(3, 1).is_recoverable());
        assert!(StatsError::ParseError("bad label".to_string()).is_recoverable());
        assert!(StatsError::DegenerateDistribution("std = 0".to_string()).is_recoverable());
        assert!(!StatsError::InvalidVariableType("Ordinal".to_string()).is_recoverable());
        assert!(!StatsError::NonNumericData("city".to_string()).is_recoverable());
    }

    #[test]
    fn test_insufficient_data_message() {
        let error = StatsError::insufficient(4, 3);
        assert_eq!(
            error.to_string(),
            "Insufficient data: 4 observation(s) required, 3 available"
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = StatsError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context_preserves_code_and_recoverability() {
        let error = StatsError::insufficient(3, 0).with_context("During normality testing");
        assert!(error.to_string().contains("During normality testing"));
        assert_eq!(error.error_code(), "INSUFFICIENT_DATA");
        assert!(error.is_recoverable());
    }
}
