//! Variable classification.
//!
//! Decides the measurement type of a cleaned column:
//! - Qualitative when too few values coerce to numbers
//! - Discrete, intervaled or continuous for numeric columns, from integer
//!   checks and unique-value ratios

mod type_inference;

use tracing::debug;

use crate::column::Column;
use crate::config::AnalysisConfig;
use crate::error::{Result, StatsError};
use crate::types::VariableType;

pub(crate) use type_inference::infer_numeric_type;

/// Classifier for column measurement types.
#[derive(Debug, Clone, Copy)]
pub struct VariableClassifier {
    numeric_ratio_threshold: f64,
}

impl Default for VariableClassifier {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl VariableClassifier {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            numeric_ratio_threshold: config.numeric_ratio_threshold,
        }
    }

    /// Classify a cleaned column.
    ///
    /// Fails with [`StatsError::InsufficientData`] when the column is empty.
    pub fn classify(&self, column: &Column) -> Result<VariableType> {
        if column.is_empty() {
            return Err(StatsError::insufficient(1, 0));
        }

        let ratio = column.numeric_ratio();
        let variable_type = if ratio < self.numeric_ratio_threshold {
            VariableType::Qualitative
        } else {
            infer_numeric_type(&column.numbers())
        };

        debug!(
            column = column.name(),
            numeric_ratio = ratio,
            %variable_type,
            "Classified column"
        );
        Ok(variable_type)
    }
}

/// Classify a column with the default thresholds.
pub fn classify(column: &Column) -> Result<VariableType> {
    VariableClassifier::default().classify(column)
}
