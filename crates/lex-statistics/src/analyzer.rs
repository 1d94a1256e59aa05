//! Column analysis orchestration.
//!
//! [`ColumnAnalyzer`] runs the full flow for one column: missing-value
//! policy, classification, frequency table, measures, quartiles, outliers
//! and normality. Numerical edge cases end up in
//! [`ColumnAnalysis::warnings`]; structural errors are returned.

use polars::prelude::*;
use tracing::{info, warn};

use crate::column::Column;
use crate::config::AnalysisConfig;
use crate::error::{Result, ResultExt, StatsError};
use crate::frequency::FrequencyTableBuilder;
use crate::measures::{compute_grouped, summarize_qualitative, summarize_raw};
use crate::normality::NormalityTester;
use crate::outliers::OutlierDetector;
use crate::profiler::VariableClassifier;
use crate::quartiles::compute_quartiles;
use crate::types::{
    ColumnAnalysis, ColumnFailure, FrameAnalysis, Measures, Quartiles, VariableType,
};

/// Analyzes columns with a fixed configuration.
#[derive(Debug, Clone)]
pub struct ColumnAnalyzer {
    config: AnalysisConfig,
    classifier: VariableClassifier,
    frequency: FrequencyTableBuilder,
    outliers: OutlierDetector,
    normality: NormalityTester,
}

static_assertions::assert_impl_all!(ColumnAnalyzer: Send, Sync);

impl Default for ColumnAnalyzer {
    fn default() -> Self {
        Self::from_valid_config(AnalysisConfig::default())
    }
}

impl ColumnAnalyzer {
    /// Create an analyzer, validating `config` first.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: AnalysisConfig) -> Self {
        Self {
            classifier: VariableClassifier::from_config(&config),
            frequency: FrequencyTableBuilder::from_config(&config),
            outliers: OutlierDetector::from_config(&config),
            normality: NormalityTester::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one column.
    pub fn analyze(&self, name: &str, series: &Series) -> Result<ColumnAnalysis> {
        let column = Column::from_series(series, self.config.missing_policy)
            .context(format!("Cleaning column '{name}'"))?;
        self.analyze_column(name, &column)
    }

    /// Analyze an already cleaned column.
    pub fn analyze_column(&self, name: &str, column: &Column) -> Result<ColumnAnalysis> {
        let variable_type = self.classifier.classify(column)?;
        info!(column = name, n = column.len(), %variable_type, "Analyzing column");

        let frequency_table = self.frequency.build(column, variable_type)?;
        let mut warnings: Vec<String> = column.notes().to_vec();

        let numbers = if variable_type.is_quantitative() {
            column.numbers()
        } else {
            Vec::new()
        };
        let non_numeric = if variable_type.is_quantitative() {
            column.len() - numbers.len()
        } else {
            0
        };
        if non_numeric > 0 {
            push_warning(
                &mut warnings,
                format!("{non_numeric} non-numeric value(s) excluded from numeric statistics"),
            );
        }

        let measures = match variable_type {
            VariableType::Qualitative => {
                recover(summarize_qualitative(&column.texts()), "qualitative summary", &mut warnings)
                    .map(Measures::Qualitative)
            }
            VariableType::DiscreteQuantitative => recover(
                summarize_raw(&numbers, self.config.confidence_level),
                "summary statistics",
                &mut warnings,
            )
            .map(Measures::Raw),
            VariableType::DiscreteQuantitativeIntervaled | VariableType::ContinuousQuantitative => {
                let grouped = compute_grouped(&frequency_table);
                if grouped.is_none() {
                    push_warning(&mut warnings, "grouped statistics: no usable intervals".to_string());
                }
                grouped.map(Measures::Grouped)
            }
        };

        let quartiles = recover(
            compute_quartiles(&numbers, &frequency_table, variable_type),
            "quartiles",
            &mut warnings,
        )
        .unwrap_or_else(Quartiles::empty);

        let (iqr_outliers, zscore_outliers, normality) = if variable_type.is_quantitative() {
            (
                recover(self.outliers.detect_iqr(&numbers), "IQR outliers", &mut warnings),
                recover(self.outliers.detect_zscore(&numbers), "Z-score outliers", &mut warnings),
                recover(self.normality.run(&numbers), "normality tests", &mut warnings)
                    .unwrap_or_default(),
            )
        } else {
            (None, None, Vec::new())
        };

        Ok(ColumnAnalysis {
            name: name.to_string(),
            variable_type,
            n: frequency_table.sample_size,
            non_numeric,
            missing: column.missing(),
            frequency_table,
            measures,
            quartiles,
            iqr_outliers,
            zscore_outliers,
            normality,
            warnings,
        })
    }

    /// Analyze the named columns of `df`.
    pub fn analyze_columns(&self, df: &DataFrame, names: &[String]) -> FrameAnalysis {
        let mut analysis = FrameAnalysis::default();

        for name in names {
            let result = df
                .column(name)
                .map_err(|_| StatsError::ColumnNotFound(name.clone()))
                .and_then(|c| self.analyze(name, c.as_materialized_series()));

            match result {
                Ok(column) => analysis.columns.push(column),
                Err(e) => {
                    warn!("Skipping column '{}': {}", name, e);
                    analysis.failures.push(ColumnFailure {
                        name: name.clone(),
                        code: e.error_code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        analysis
    }

    /// Analyze every column of `df`. A failing column is reported, not fatal.
    pub fn analyze_frame(&self, df: &DataFrame) -> FrameAnalysis {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.analyze_columns(df, &names)
    }
}

/// Record a failed step as a warning on the column.
fn recover<T>(result: Result<T>, what: &str, warnings: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            if !e.is_recoverable() {
                warn!("{} failed: {}", what, e);
            }
            push_warning(warnings, format!("{what}: {e}"));
            None
        }
    }
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    tracing::debug!("{}", message);
    warnings.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NormalityOutcome, RowLabel};

    #[test]
    fn test_discrete_column() {
        let series = Series::new("x".into(), &[1i64, 2, 2, 3, 3, 3, 4, 4, 5]);
        let analysis = ColumnAnalyzer::default().analyze("x", &series).unwrap();

        assert_eq!(analysis.variable_type, VariableType::DiscreteQuantitative);
        assert_eq!(analysis.n, 9);
        assert!(matches!(analysis.measures, Some(Measures::Raw(_))));
        assert_eq!(analysis.quartiles.q2, Some(3.0));
        assert!(analysis.iqr_outliers.is_some());
        assert!(!analysis.normality.is_empty());
    }

    #[test]
    fn test_sample_size_counts_numeric_cells_only() {
        let mut values: Vec<String> = (0..19).map(|i| (i % 4 + 1).to_string()).collect();
        values.push("pending".to_string());
        let series = Series::new("score".into(), &values);
        let analysis = ColumnAnalyzer::default().analyze("score", &series).unwrap();

        assert_eq!(analysis.variable_type, VariableType::DiscreteQuantitative);
        assert_eq!(analysis.n, 19);
        assert_eq!(analysis.non_numeric, 1);
        assert_eq!(analysis.n, analysis.frequency_table.sample_size);
        match &analysis.measures {
            Some(Measures::Raw(summary)) => assert_eq!(summary.n, 19),
            other => panic!("unexpected measures {other:?}"),
        }
        assert!(analysis.warnings.iter().any(|w| w.contains("non-numeric")));
    }

    #[test]
    fn test_qualitative_column_skips_numeric_steps() {
        let series = Series::new("city".into(), &["Lima", "Quito", "Lima", "Bogota"]);
        let analysis = ColumnAnalyzer::default().analyze("city", &series).unwrap();

        assert_eq!(analysis.variable_type, VariableType::Qualitative);
        assert!(matches!(analysis.measures, Some(Measures::Qualitative(_))));
        assert!(analysis.quartiles.is_empty());
        assert!(analysis.iqr_outliers.is_none());
        assert!(analysis.normality.is_empty());
        assert!(analysis.warnings.is_empty());
        assert_eq!(analysis.frequency_table.data_rows().count(), 3);
    }

    #[test]
    fn test_small_column_records_warnings() {
        let series = Series::new("x".into(), &[4.0, 7.0]);
        let analysis = ColumnAnalyzer::default().analyze("x", &series).unwrap();

        assert!(analysis.quartiles.is_empty());
        assert!(analysis.normality.is_empty());
        assert!(analysis.warnings.iter().any(|w| w.starts_with("normality tests")));
    }

    #[test]
    fn test_constant_column_reports_failed_ks() {
        let series = Series::new("x".into(), &[5.0; 12]);
        let analysis = ColumnAnalyzer::default().analyze("x", &series).unwrap();

        assert_eq!(analysis.zscore_outliers.as_ref().map(|r| r.count), Some(0));
        assert!(
            analysis
                .normality
                .iter()
                .any(|r| matches!(r.outcome, NormalityOutcome::Failed { .. }))
        );
        assert_eq!(analysis.frequency_table.rows[0].label, RowLabel::Value(5.0));
    }

    #[test]
    fn test_all_missing_column_fails() {
        let series = Series::new("x".into(), &[None::<f64>, None]);
        let err = ColumnAnalyzer::default().analyze("x", &series).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_frame_analysis_collects_failures() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0],
            "empty" => [None::<f64>, None, None, None],
        ]
        .unwrap();
        let frame = ColumnAnalyzer::default().analyze_frame(&df);

        assert_eq!(frame.columns.len(), 1);
        assert_eq!(frame.failures.len(), 1);
        assert_eq!(frame.failures[0].name, "empty");
        assert_eq!(frame.failures[0].code, "INSUFFICIENT_DATA");
    }

    #[test]
    fn test_unknown_column_is_reported() {
        let df = df!["x" => [1.0, 2.0]].unwrap();
        let frame = ColumnAnalyzer::default().analyze_columns(&df, &["nope".to_string()]);
        assert_eq!(frame.failures[0].code, "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AnalysisConfig {
            alpha: 2.0,
            ..AnalysisConfig::default()
        };
        assert_eq!(
            ColumnAnalyzer::new(config).unwrap_err().error_code(),
            "INVALID_CONFIG"
        );
    }
}
