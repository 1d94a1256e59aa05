//! Configuration types for the statistics engine.
//!
//! Thresholds that the algorithms use are collected in [`AnalysisConfig`],
//! built with a fluent builder and validated before use.

use serde::{Deserialize, Serialize};

/// Policy for missing entries in a column before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Drop missing entries
    #[default]
    Drop,
    /// Replace missing entries with the mean of the numeric values
    Mean,
    /// Replace missing entries with the median of the numeric values
    Median,
    /// Replace missing entries with 0
    Zero,
}

/// Configuration for column analysis.
///
/// Use [`AnalysisConfig::builder()`] to create a configuration with a
/// fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_statistics::config::{AnalysisConfig, MissingValuePolicy};
///
/// let config = AnalysisConfig::builder()
///     .z_threshold(2.5)
///     .missing_policy(MissingValuePolicy::Median)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum share of values that must coerce to numbers for a column
    /// to be treated as quantitative.
    /// Default: 0.9
    pub numeric_ratio_threshold: f64,

    /// Minimum share of values that must parse as dates for a column to be
    /// treated as a date column.
    /// Default: 0.8
    pub date_ratio_threshold: f64,

    /// Minimum share of numeric-coercible values for a non-date column to
    /// be kept in the correlation input.
    /// Default: 0.8
    pub correlation_numeric_threshold: f64,

    /// Multiplier applied to the IQR for the outlier fences.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Absolute z-score above which a value is an outlier.
    /// Default: 3.0
    pub z_threshold: f64,

    /// Maximum number of outlier values listed in a report.
    /// Default: 20
    pub max_outlier_values: usize,

    /// Significance level of the normality tests.
    /// Default: 0.05
    pub alpha: f64,

    /// Largest sample on which Shapiro-Wilk runs.
    /// Default: 5000
    pub shapiro_max_n: usize,

    /// Smallest sample on which D'Agostino-Pearson runs.
    /// Default: 8
    pub dagostino_min_n: usize,

    /// Confidence level of the interval for the mean.
    /// Default: 0.95
    pub confidence_level: f64,

    /// How missing entries are handled before analysis.
    /// Default: Drop
    pub missing_policy: MissingValuePolicy,

    /// Smallest acceptable candidate bin count.
    /// Default: 5
    pub min_bins: usize,

    /// Largest acceptable candidate bin count.
    /// Default: 30
    pub max_bins: usize,

    /// Upper clamp on the Sturges fallback when no candidate is acceptable.
    /// Default: 20
    pub fallback_max_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            numeric_ratio_threshold: 0.9,
            date_ratio_threshold: 0.8,
            correlation_numeric_threshold: 0.8,
            iqr_multiplier: 1.5,
            z_threshold: 3.0,
            max_outlier_values: 20,
            alpha: 0.05,
            shapiro_max_n: 5000,
            dagostino_min_n: 8,
            confidence_level: 0.95,
            missing_policy: MissingValuePolicy::default(),
            min_bins: 5,
            max_bins: 30,
            fallback_max_bins: 20,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let ratios = [
            ("numeric_ratio_threshold", self.numeric_ratio_threshold),
            ("date_ratio_threshold", self.date_ratio_threshold),
            (
                "correlation_numeric_threshold",
                self.correlation_numeric_threshold,
            ),
            ("confidence_level", self.confidence_level),
        ];
        for (field, value) in ratios {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "alpha".to_string(),
                value: self.alpha,
            });
        }

        for (field, value) in [
            ("iqr_multiplier", self.iqr_multiplier),
            ("z_threshold", self.z_threshold),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigValidationError::NonPositive {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.min_bins == 0 || self.min_bins > self.max_bins {
            return Err(ConfigValidationError::InvalidBinRange {
                min: self.min_bins,
                max: self.max_bins,
            });
        }

        if self.fallback_max_bins < self.min_bins {
            return Err(ConfigValidationError::InvalidBinRange {
                min: self.min_bins,
                max: self.fallback_max_bins,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be in (0.0, 1.0])")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid value for '{field}': {value} (must be a positive finite number)")]
    NonPositive { field: String, value: f64 },

    #[error("Invalid bin range: min {min}, max {max}")]
    InvalidBinRange { min: usize, max: usize },
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    numeric_ratio_threshold: Option<f64>,
    date_ratio_threshold: Option<f64>,
    correlation_numeric_threshold: Option<f64>,
    iqr_multiplier: Option<f64>,
    z_threshold: Option<f64>,
    max_outlier_values: Option<usize>,
    alpha: Option<f64>,
    shapiro_max_n: Option<usize>,
    dagostino_min_n: Option<usize>,
    confidence_level: Option<f64>,
    missing_policy: Option<MissingValuePolicy>,
    min_bins: Option<usize>,
    max_bins: Option<usize>,
    fallback_max_bins: Option<usize>,
}

impl AnalysisConfigBuilder {
    /// Set the share of numeric-coercible values required for a
    /// quantitative column.
    pub fn numeric_ratio_threshold(mut self, threshold: f64) -> Self {
        self.numeric_ratio_threshold = Some(threshold);
        self
    }

    /// Set the share of parseable dates required for a date column.
    pub fn date_ratio_threshold(mut self, threshold: f64) -> Self {
        self.date_ratio_threshold = Some(threshold);
        self
    }

    /// Set the share of numeric values required to keep a column in the
    /// correlation input.
    pub fn correlation_numeric_threshold(mut self, threshold: f64) -> Self {
        self.correlation_numeric_threshold = Some(threshold);
        self
    }

    /// Set the IQR fence multiplier.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set the z-score outlier threshold.
    pub fn z_threshold(mut self, threshold: f64) -> Self {
        self.z_threshold = Some(threshold);
        self
    }

    /// Set how many outlier values a report lists.
    pub fn max_outlier_values(mut self, max: usize) -> Self {
        self.max_outlier_values = Some(max);
        self
    }

    /// Set the significance level of the normality tests.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Set the largest sample on which Shapiro-Wilk runs.
    pub fn shapiro_max_n(mut self, n: usize) -> Self {
        self.shapiro_max_n = Some(n);
        self
    }

    /// Set the smallest sample on which D'Agostino-Pearson runs.
    pub fn dagostino_min_n(mut self, n: usize) -> Self {
        self.dagostino_min_n = Some(n);
        self
    }

    /// Set the confidence level of the interval for the mean.
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = Some(level);
        self
    }

    /// Set the missing-value policy.
    pub fn missing_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_policy = Some(policy);
        self
    }

    /// Set the acceptable candidate bin-count range.
    pub fn bin_range(mut self, min: usize, max: usize) -> Self {
        self.min_bins = Some(min);
        self.max_bins = Some(max);
        self
    }

    /// Set the clamp applied to the Sturges fallback.
    pub fn fallback_max_bins(mut self, max: usize) -> Self {
        self.fallback_max_bins = Some(max);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            numeric_ratio_threshold: self
                .numeric_ratio_threshold
                .unwrap_or(defaults.numeric_ratio_threshold),
            date_ratio_threshold: self
                .date_ratio_threshold
                .unwrap_or(defaults.date_ratio_threshold),
            correlation_numeric_threshold: self
                .correlation_numeric_threshold
                .unwrap_or(defaults.correlation_numeric_threshold),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            z_threshold: self.z_threshold.unwrap_or(defaults.z_threshold),
            max_outlier_values: self
                .max_outlier_values
                .unwrap_or(defaults.max_outlier_values),
            alpha: self.alpha.unwrap_or(defaults.alpha),
            shapiro_max_n: self.shapiro_max_n.unwrap_or(defaults.shapiro_max_n),
            dagostino_min_n: self.dagostino_min_n.unwrap_or(defaults.dagostino_min_n),
            confidence_level: self.confidence_level.unwrap_or(defaults.confidence_level),
            missing_policy: self.missing_policy.unwrap_or_default(),
            min_bins: self.min_bins.unwrap_or(defaults.min_bins),
            max_bins: self.max_bins.unwrap_or(defaults.max_bins),
            fallback_max_bins: self.fallback_max_bins.unwrap_or(defaults.fallback_max_bins),
        };

        config.validate()?;
        Ok(config)
    }
}
