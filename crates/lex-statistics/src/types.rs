//! Result and data-model types shared by the analysis components.
//!
//! Every type here is plain data: produced once by a component and read by
//! presentation or export layers. Numeric fields always hold numbers; the
//! only display strings are interval labels and interpretations.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StatsError;

// ============================================================================
// Variable classification
// ============================================================================

/// Measurement type of a column. Selects every downstream code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Qualitative,
    DiscreteQuantitative,
    DiscreteQuantitativeIntervaled,
    ContinuousQuantitative,
}

impl VariableType {
    /// Stable tag used in serialized output and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qualitative => "qualitative",
            Self::DiscreteQuantitative => "discrete_quantitative",
            Self::DiscreteQuantitativeIntervaled => "discrete_quantitative_intervaled",
            Self::ContinuousQuantitative => "continuous_quantitative",
        }
    }

    /// True for every type except [`VariableType::Qualitative`].
    pub fn is_quantitative(&self) -> bool {
        !matches!(self, Self::Qualitative)
    }

    /// True for the types whose frequency table is binned into intervals.
    pub fn is_grouped(&self) -> bool {
        matches!(
            self,
            Self::DiscreteQuantitativeIntervaled | Self::ContinuousQuantitative
        )
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qualitative" => Ok(Self::Qualitative),
            "discrete_quantitative" | "discrete" => Ok(Self::DiscreteQuantitative),
            "discrete_quantitative_intervaled" | "intervaled" => {
                Ok(Self::DiscreteQuantitativeIntervaled)
            }
            "continuous_quantitative" | "continuous" => Ok(Self::ContinuousQuantitative),
            other => Err(StatsError::InvalidVariableType(other.to_string())),
        }
    }
}

// ============================================================================
// Intervals
// ============================================================================

/// Matches labels such as `[10.0000 - 20.0000)`, including negative bounds.
static INTERVAL_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[\[(]\s*(-?\d+(?:\.\d*)?(?:[eE][-+]?\d+)?)\s+-\s+(-?\d+(?:\.\d*)?(?:[eE][-+]?\d+)?)\s*[\])]\s*$")
        .expect("interval label pattern is valid")
});

/// Half-open numeric interval `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Class mark.
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value < self.upper
    }

    /// Display label, e.g. `[10.0000 - 20.0000)`.
    pub fn label(&self) -> String {
        format!("[{:.4} - {:.4})", self.lower, self.upper)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Interval {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = INTERVAL_LABEL
            .captures(s)
            .ok_or_else(|| StatsError::ParseError(format!("malformed interval label '{s}'")))?;

        let bound = |i: usize| -> Result<f64, StatsError> {
            caps[i]
                .parse::<f64>()
                .map_err(|e| StatsError::ParseError(format!("bad bound in '{s}': {e}")))
        };

        let interval = Interval::new(bound(1)?, bound(2)?);
        if interval.upper < interval.lower {
            return Err(StatsError::ParseError(format!(
                "interval '{s}' has upper bound below lower bound"
            )));
        }
        Ok(interval)
    }
}

// ============================================================================
// Frequency tables
// ============================================================================

/// What a frequency row counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RowLabel {
    /// A distinct numeric value (discrete quantitative).
    Value(f64),
    /// A distinct category (qualitative).
    Text(String),
    /// A bin (grouped types).
    Interval(Interval),
    /// The synthetic terminating row.
    Total,
}

impl RowLabel {
    pub fn is_total(&self) -> bool {
        matches!(self, Self::Total)
    }

    pub fn interval(&self) -> Option<Interval> {
        match self {
            Self::Interval(interval) => Some(*interval),
            _ => None,
        }
    }
}

impl fmt::Display for RowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Text(t) => f.write_str(t),
            Self::Interval(interval) => write!(f, "{interval}"),
            Self::Total => f.write_str("Total"),
        }
    }
}

/// One bucket of a frequency distribution.
///
/// Cumulative fields are `None` on the Total row; `class_mark` is only set
/// on interval rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRow {
    pub label: RowLabel,
    pub class_mark: Option<f64>,
    pub absolute: usize,
    pub relative: f64,
    pub percentage: f64,
    pub cumulative_absolute: Option<usize>,
    pub cumulative_relative: Option<f64>,
    pub cumulative_percentage: Option<f64>,
}

impl FrequencyRow {
    pub fn is_total(&self) -> bool {
        self.label.is_total()
    }
}

/// Summary of how the bin count of a grouped table was chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSelection {
    pub sturges: usize,
    pub rice: usize,
    pub scott: usize,
    pub freedman_diaconis: usize,
    /// Bin count before width rounding.
    pub chosen: usize,
    /// Rounded bin width.
    pub width: f64,
    /// Bin count actually produced by the rounded width.
    pub bins: usize,
}

/// Frequency distribution of one column, terminated by a Total row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub variable_type: VariableType,
    pub rows: Vec<FrequencyRow>,
    /// Number of observations the table was built from.
    pub sample_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_selection: Option<BinSelection>,
}

impl FrequencyTable {
    /// Rows excluding the Total row.
    pub fn data_rows(&self) -> impl Iterator<Item = &FrequencyRow> {
        self.rows.iter().filter(|row| !row.is_total())
    }

    pub fn total_row(&self) -> Option<&FrequencyRow> {
        self.rows.iter().find(|row| row.is_total())
    }
}

// ============================================================================
// Summary statistics
// ============================================================================

/// A statistic that may be undefined for the data at hand.
///
/// Serialized as a plain number, or as the string `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Estimate {
    Value(f64),
    #[default]
    NotApplicable,
}

impl Estimate {
    /// Wrap a value, mapping non-finite results to `NotApplicable`.
    pub fn from_finite(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::NotApplicable
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl From<Option<f64>> for Estimate {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::NotApplicable, Self::from_finite)
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.4}"),
            Self::NotApplicable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Estimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for Estimate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Self::Value(v)),
            Repr::Text(t) if t == "N/A" => Ok(Self::NotApplicable),
            Repr::Text(t) => Err(serde::de::Error::custom(format!(
                "expected a number or \"N/A\", got \"{t}\""
            ))),
        }
    }
}

/// Estimators computed from a grouped (binned) frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedSummary {
    pub n: usize,
    pub mean: f64,
    pub median: Estimate,
    pub mode: Estimate,
    pub harmonic_mean: Estimate,
    pub geometric_mean: Estimate,
    pub population_variance: f64,
    pub sample_variance: f64,
    pub population_std: f64,
    pub sample_std: f64,
    /// Percent, from the population standard deviation.
    pub coefficient_of_variation: f64,
    pub skewness: Estimate,
    pub excess_kurtosis: Estimate,
    pub standard_error: Estimate,
    /// Lower bound of the first bin.
    pub min_bound: f64,
    /// Upper bound of the last bin.
    pub max_bound: f64,
    pub range: f64,
}

/// How many values share the highest frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Unimodal,
    Bimodal,
    Multimodal,
}

/// Confidence interval for the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
    pub margin: f64,
}

/// Estimators computed directly from ungrouped numeric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSummary {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub modes: Vec<f64>,
    pub modality: Modality,
    pub harmonic_mean: Estimate,
    pub geometric_mean: Estimate,
    pub sample_variance: Estimate,
    pub population_variance: f64,
    pub sample_std: Estimate,
    pub population_std: f64,
    /// Percent, from the sample standard deviation.
    pub coefficient_of_variation: Estimate,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub p10: f64,
    pub p90: f64,
    pub skewness: Estimate,
    pub skewness_interpretation: Option<String>,
    pub excess_kurtosis: Estimate,
    pub kurtosis_interpretation: Option<String>,
    pub standard_error: Estimate,
    pub confidence_interval: Option<ConfidenceInterval>,
}

/// Summary of a qualitative column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeSummary {
    pub n: usize,
    pub unique: usize,
    pub mode: String,
    pub mode_frequency: usize,
    pub mode_proportion: f64,
    /// Shannon entropy in bits.
    pub entropy: f64,
}

// ============================================================================
// Quartiles and outliers
// ============================================================================

/// Q1, Q2 and Q3; all `None` when quartiles do not apply.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: Option<f64>,
    pub q2: Option<f64>,
    pub q3: Option<f64>,
}

impl Quartiles {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.q1.is_none() && self.q2.is_none() && self.q3.is_none()
    }

    pub fn iqr(&self) -> Option<f64> {
        Some(self.q3? - self.q1?)
    }
}

/// Outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    Iqr,
    ZScore,
}

/// Method-specific bounds of an outlier report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierBounds {
    Iqr {
        q1: f64,
        q3: f64,
        iqr: f64,
        lower: f64,
        upper: f64,
    },
    ZScore {
        mean: f64,
        std: f64,
        threshold: f64,
    },
}

/// Outliers found in a column by one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub method: OutlierMethod,
    pub bounds: OutlierBounds,
    pub count: usize,
    pub percentage: f64,
    /// First outliers in encounter order, capped.
    pub values: Vec<f64>,
}

// ============================================================================
// Normality
// ============================================================================

/// A normality test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalityTest {
    ShapiroWilk,
    KolmogorovSmirnov,
    DagostinoPearson,
}

impl NormalityTest {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ShapiroWilk => "Shapiro-Wilk",
            Self::KolmogorovSmirnov => "Kolmogorov-Smirnov",
            Self::DagostinoPearson => "D'Agostino-Pearson",
        }
    }
}

/// What happened when a normality test ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NormalityOutcome {
    Completed {
        statistic: f64,
        p_value: f64,
        is_normal: bool,
        interpretation: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityResult {
    pub test: NormalityTest,
    #[serde(flatten)]
    pub outcome: NormalityOutcome,
}

impl NormalityResult {
    pub fn is_normal(&self) -> Option<bool> {
        match &self.outcome {
            NormalityOutcome::Completed { is_normal, .. } => Some(*is_normal),
            NormalityOutcome::Failed { .. } => None,
        }
    }
}

// ============================================================================
// Dates
// ============================================================================

/// A column recognized as dates and converted to day offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateConversion {
    /// chrono format string, or `"flexible"` for the fallback parser.
    pub format: String,
    pub min: chrono::NaiveDate,
    pub max: chrono::NaiveDate,
    pub range_days: i64,
    /// Days since `min`, aligned with the input; `None` for unparseable cells.
    pub offsets: Vec<Option<i64>>,
    pub parsed: usize,
}

/// Outcome of date detection on a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateDetection {
    NotDate,
    Date(DateConversion),
}

impl DateDetection {
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

// ============================================================================
// Analysis reports
// ============================================================================

/// Measures computed for a column; which variant depends on its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measures {
    Grouped(GroupedSummary),
    Raw(RawSummary),
    Qualitative(QualitativeSummary),
}

/// Complete descriptive analysis of one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnAnalysis {
    pub name: String,
    pub variable_type: VariableType,
    /// Observations analyzed after the missing-value policy. For
    /// quantitative types only numeric cells count.
    pub n: usize,
    /// Text cells left out of a quantitative column's statistics.
    #[serde(default)]
    pub non_numeric: usize,
    /// Missing entries in the source column.
    pub missing: usize,
    pub frequency_table: FrequencyTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measures: Option<Measures>,
    pub quartiles: Quartiles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iqr_outliers: Option<OutlierReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zscore_outliers: Option<OutlierReport>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub normality: Vec<NormalityResult>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

/// A column that could not be analyzed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnFailure {
    pub name: String,
    pub code: String,
    pub message: String,
}

/// Analysis of a whole table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub columns: Vec<ColumnAnalysis>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<ColumnFailure>,
}
