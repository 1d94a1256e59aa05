//! Descriptive Statistics Library
//!
//! A descriptive statistics engine for tabular data, built with Rust and Polars.
//!
//! # Overview
//!
//! Given one column of a table, the engine:
//!
//! - **Classifies** it as qualitative, discrete, discrete-intervaled or continuous
//! - **Builds a frequency table**, choosing the bin count adaptively for grouped types
//! - **Estimates measures** from the table (grouped data) or from the raw values
//! - **Computes quartiles** by rank interpolation or grouped interpolation
//! - **Detects outliers** with IQR fences and Z-scores
//! - **Tests normality** with Shapiro-Wilk, Kolmogorov-Smirnov and D'Agostino-Pearson
//! - **Normalizes dates** to day offsets so they can enter a correlation matrix
//!
//! Numerical edge cases (too few values, zero variance) never abort an
//! analysis: they surface as "not applicable" estimates and warnings.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_statistics::{ColumnAnalyzer, ReadOptions, load_csv};
//!
//! let df = load_csv("data.csv", &ReadOptions::default())?;
//! let analysis = ColumnAnalyzer::default().analyze_frame(&df);
//!
//! for column in &analysis.columns {
//!     println!("{}: {}", column.name, column.variable_type);
//!     for row in &column.frequency_table.rows {
//!         println!("  {} -> {}", row.label, row.absolute);
//!     }
//! }
//! ```
//!
//! # Using the components directly
//!
//! ```rust,ignore
//! use lex_statistics::{Column, FrequencyTableBuilder, VariableClassifier, compute_grouped};
//!
//! let column = Column::from_numbers("price", &prices);
//! let variable_type = VariableClassifier::default().classify(&column)?;
//! let table = FrequencyTableBuilder::default().build(&column, variable_type)?;
//!
//! if variable_type.is_grouped() {
//!     let summary = compute_grouped(&table);
//! }
//! ```
//!
//! # Configuration
//!
//! Use [`AnalysisConfig`] to tune thresholds:
//!
//! ```rust,ignore
//! use lex_statistics::{AnalysisConfig, MissingValuePolicy};
//!
//! let config = AnalysisConfig::builder()
//!     .missing_policy(MissingValuePolicy::Median)
//!     .z_threshold(2.5)
//!     .alpha(0.01)
//!     .bin_range(5, 20)
//!     .build()?;
//! ```

pub mod analyzer;
pub mod column;
pub mod config;
pub mod correlation;
pub mod dates;
pub mod error;
pub mod frequency;
pub mod ingest;
pub mod measures;
pub mod normality;
pub mod outliers;
pub mod profiler;
pub mod quartiles;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analyzer::ColumnAnalyzer;
pub use column::{Cell, Column};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError, MissingValuePolicy};
pub use correlation::{
    ColumnConversion, CorrelationCell, CorrelationMatrix, PreparedColumn, PreparedTable,
    pearson_matrix, prepare_for_correlation,
};
pub use dates::{DateNormalizer, detect_and_convert};
pub use error::{Result as StatsResult, ResultExt, StatsError};
pub use frequency::{FrequencyTableBuilder, build_frequency_table, table_from_labels};
pub use ingest::{ReadOptions, TableCache, TextEncoding, load_csv, read_csv_bytes};
pub use measures::{compute_grouped, summarize_qualitative, summarize_raw};
pub use normality::NormalityTester;
pub use outliers::OutlierDetector;
pub use profiler::{VariableClassifier, classify};
pub use quartiles::compute_quartiles;
pub use types::{
    BinSelection, ColumnAnalysis, ColumnFailure, ConfidenceInterval, DateConversion,
    DateDetection, Estimate, FrameAnalysis, FrequencyRow, FrequencyTable, GroupedSummary,
    Interval, Measures, Modality, NormalityOutcome, NormalityResult, NormalityTest,
    OutlierBounds, OutlierMethod, OutlierReport, QualitativeSummary, Quartiles, RawSummary,
    RowLabel, VariableType,
};
