//! Frequency distributions.
//!
//! Qualitative and discrete columns are tabulated per distinct value;
//! intervaled and continuous columns are binned with the adaptive rules in
//! [`binning`]. Every table ends with a Total row.

pub mod binning;

use tracing::{debug, warn};

use crate::column::Column;
use crate::config::AnalysisConfig;
use crate::error::{Result, StatsError};
use crate::types::{FrequencyRow, FrequencyTable, Interval, RowLabel, VariableType};
use crate::utils::sorted;

pub use binning::{BinLimits, BinPlan, bin_index, plan_bins};

/// Builds frequency tables for cleaned columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyTableBuilder {
    limits: BinLimits,
}

impl FrequencyTableBuilder {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            limits: BinLimits {
                min_bins: config.min_bins,
                max_bins: config.max_bins,
                fallback_max_bins: config.fallback_max_bins,
            },
        }
    }

    /// Build the frequency table of `column` as `variable_type`.
    pub fn build(&self, column: &Column, variable_type: VariableType) -> Result<FrequencyTable> {
        if column.is_empty() {
            return Err(StatsError::insufficient(1, 0));
        }

        match variable_type {
            VariableType::Qualitative => {
                let counts: Vec<(RowLabel, usize)> = column
                    .text_counts()
                    .into_iter()
                    .map(|(value, count)| (RowLabel::Text(value), count))
                    .collect();
                Ok(assemble(variable_type, counts, None))
            }
            VariableType::DiscreteQuantitative => {
                let values = numeric_values(column)?;
                Ok(assemble(variable_type, value_counts(&values), None))
            }
            VariableType::DiscreteQuantitativeIntervaled | VariableType::ContinuousQuantitative => {
                let values = sorted(&numeric_values(column)?);
                self.build_grouped(&values, variable_type)
            }
        }
    }

    fn build_grouped(&self, sorted: &[f64], variable_type: VariableType) -> Result<FrequencyTable> {
        let plan = plan_bins(sorted, self.limits)
            .ok_or_else(|| StatsError::insufficient(1, sorted.len()))?;

        let mut counts = vec![0usize; plan.intervals.len()];
        for value in sorted {
            if let Some(idx) = bin_index(&plan.intervals, *value) {
                counts[idx] += 1;
            }
        }

        let rows: Vec<(RowLabel, usize)> = plan
            .intervals
            .iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|(interval, count)| (RowLabel::Interval(*interval), count))
            .collect();

        Ok(assemble(variable_type, rows, Some(plan.selection)))
    }
}

/// Build a frequency table with the default bin limits.
pub fn build_frequency_table(column: &Column, variable_type: VariableType) -> Result<FrequencyTable> {
    FrequencyTableBuilder::default().build(column, variable_type)
}

/// Rebuild a grouped table from display labels such as `[10.0000 - 20.0000)`
/// and their absolute frequencies, e.g. a table read back from an export.
///
/// Rows whose label does not parse are skipped; the Total row is ignored.
/// Fails with [`StatsError::ParseError`] if no row survives.
pub fn table_from_labels<S: AsRef<str>>(
    variable_type: VariableType,
    rows: &[(S, usize)],
) -> Result<FrequencyTable> {
    if !variable_type.is_grouped() {
        return Err(StatsError::InvalidVariableType(format!(
            "{variable_type} tables are not grouped"
        )));
    }

    let mut parsed = Vec::with_capacity(rows.len());
    for (label, count) in rows {
        let label = label.as_ref();
        if label.trim().eq_ignore_ascii_case("total") {
            continue;
        }
        match label.parse::<Interval>() {
            Ok(interval) => parsed.push((RowLabel::Interval(interval), *count)),
            Err(e) => warn!("Skipping frequency row: {}", e),
        }
    }

    if parsed.is_empty() {
        return Err(StatsError::ParseError(
            "no interval label could be parsed".to_string(),
        ));
    }

    Ok(assemble(variable_type, parsed, None))
}

fn numeric_values(column: &Column) -> Result<Vec<f64>> {
    let values = column.numbers();
    if values.is_empty() {
        return Err(StatsError::NonNumericData(column.name().to_string()));
    }
    Ok(values)
}

/// Count each distinct value, ascending.
fn value_counts(values: &[f64]) -> Vec<(RowLabel, usize)> {
    let mut counts: Vec<(RowLabel, usize)> = Vec::new();
    for value in sorted(values) {
        match counts.last_mut() {
            Some((RowLabel::Value(last), count)) if *last == value => *count += 1,
            _ => counts.push((RowLabel::Value(value), 1)),
        }
    }
    counts
}

/// Accumulate frequencies over ordered `(label, count)` rows and append Total.
fn assemble(
    variable_type: VariableType,
    counts: Vec<(RowLabel, usize)>,
    bin_selection: Option<crate::types::BinSelection>,
) -> FrequencyTable {
    let n: usize = counts.iter().map(|(_, count)| count).sum();
    let total = n.max(1) as f64;

    let mut rows = Vec::with_capacity(counts.len() + 1);
    let mut cumulative = 0usize;
    let mut relative_sum = 0.0;

    for (label, count) in counts {
        cumulative += count;
        let relative = count as f64 / total;
        let cumulative_relative = cumulative as f64 / total;
        relative_sum += relative;

        rows.push(FrequencyRow {
            class_mark: label.interval().map(|i| i.midpoint()),
            label,
            absolute: count,
            relative,
            percentage: relative * 100.0,
            cumulative_absolute: Some(cumulative),
            cumulative_relative: Some(cumulative_relative),
            cumulative_percentage: Some(cumulative_relative * 100.0),
        });
    }

    rows.push(FrequencyRow {
        label: RowLabel::Total,
        class_mark: None,
        absolute: n,
        relative: relative_sum,
        percentage: relative_sum * 100.0,
        cumulative_absolute: None,
        cumulative_relative: None,
        cumulative_percentage: None,
    });

    debug!(%variable_type, n, rows = rows.len() - 1, "Built frequency table");

    FrequencyTable {
        variable_type,
        rows,
        sample_size: n,
        bin_selection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingValuePolicy;
    use polars::prelude::{NamedFrom, Series};
    use pretty_assertions::assert_eq;

    fn assert_invariants(table: &FrequencyTable) {
        let data: Vec<&FrequencyRow> = table.data_rows().collect();
        let sum: usize = data.iter().map(|r| r.absolute).sum();
        assert_eq!(sum, table.sample_size);

        let last = data.last().unwrap();
        assert_eq!(last.cumulative_absolute, Some(table.sample_size));
        assert!((last.cumulative_relative.unwrap() - 1.0).abs() < 1e-6);

        let total = table.total_row().unwrap();
        assert_eq!(total.absolute, table.sample_size);
        assert_eq!(total.cumulative_absolute, None);
    }

    #[test]
    fn test_discrete_table() {
        let column = Column::from_numbers("x", &[1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 5.0]);
        let table = build_frequency_table(&column, VariableType::DiscreteQuantitative).unwrap();

        assert_eq!(table.rows.len(), 6);
        let row = &table.rows[2];
        assert_eq!(row.label, RowLabel::Value(3.0));
        assert_eq!(row.absolute, 3);
        assert!((row.relative - 0.3333).abs() < 1e-4);
        assert_eq!(row.cumulative_absolute, Some(6));
        assert_invariants(&table);
    }

    #[test]
    fn test_qualitative_table_is_sorted_by_value() {
        let column = Column::from_texts("c", &["b", "a", "c", "a"]);
        let table = build_frequency_table(&column, VariableType::Qualitative).unwrap();

        let labels: Vec<String> = table.rows.iter().map(|r| r.label.to_string()).collect();
        assert_eq!(labels, vec!["a", "b", "c", "Total"]);
        assert_eq!(table.rows[0].absolute, 2);
        assert!(table.rows.iter().all(|r| r.class_mark.is_none()));
        assert_invariants(&table);
    }

    #[test]
    fn test_category_words_keep_their_rows() {
        let series = Series::new(
            "status".into(),
            &["ok", "unknown", "error", "missing", "none", "ok"],
        );
        let column = Column::from_series(&series, MissingValuePolicy::Drop).unwrap();
        assert_eq!(column.missing(), 0);

        let table = build_frequency_table(&column, VariableType::Qualitative).unwrap();
        let labels: Vec<String> = table.rows.iter().map(|r| r.label.to_string()).collect();
        assert_eq!(
            labels,
            vec!["error", "missing", "none", "ok", "unknown", "Total"]
        );
        assert_eq!(table.total_row().map(|r| r.absolute), Some(6));
        assert_invariants(&table);
    }

    #[test]
    fn test_grouped_table() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let column = Column::from_numbers("x", &values);
        let table = build_frequency_table(&column, VariableType::ContinuousQuantitative).unwrap();

        assert_eq!(table.data_rows().count(), 5);
        assert_eq!(table.rows[0].class_mark, Some(10.0));
        assert_eq!(table.rows[0].absolute, 20);
        assert_eq!(table.rows[4].absolute, 20);
        assert!(table.bin_selection.is_some());
        assert_invariants(&table);
    }

    #[test]
    fn test_grouped_table_skips_empty_bins() {
        let mut values = vec![1.0; 40];
        values.extend(vec![100.0; 40]);
        values.push(50.5);
        let column = Column::from_numbers("gap", &values);
        let table = build_frequency_table(&column, VariableType::ContinuousQuantitative).unwrap();

        assert!(table.data_rows().all(|r| r.absolute > 0));
        assert_invariants(&table);
    }

    #[test]
    fn test_single_value_grouped_table() {
        let column = Column::from_numbers("x", &[4.0, 4.0, 4.0, 4.0]);
        let table =
            build_frequency_table(&column, VariableType::DiscreteQuantitativeIntervaled).unwrap();

        assert_eq!(table.data_rows().count(), 1);
        assert!((table.rows[0].class_mark.unwrap() - 4.0).abs() < 1e-9);
        let bin = table.rows[0].label.interval().unwrap();
        assert!(bin.contains(4.0));
        assert!(bin.width() < 0.001);
        assert_invariants(&table);
    }

    #[test]
    fn test_non_numeric_column_as_discrete_fails() {
        let column = Column::from_texts("c", &["a", "b"]);
        let err = build_frequency_table(&column, VariableType::DiscreteQuantitative).unwrap_err();
        assert_eq!(err.error_code(), "NON_NUMERIC_DATA");
    }

    #[test]
    fn test_empty_column_fails() {
        let column = Column::from_numbers("x", &[]);
        let err = build_frequency_table(&column, VariableType::Qualitative).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_table_from_labels_skips_malformed_rows() {
        let rows = [
            ("[0.0000 - 10.0000)", 4usize),
            ("garbage", 3),
            ("[10.0000 - 20.0000)", 6),
            ("Total", 13),
        ];
        let table = table_from_labels(VariableType::ContinuousQuantitative, &rows).unwrap();

        assert_eq!(table.sample_size, 10);
        assert_eq!(table.data_rows().count(), 2);
        assert_eq!(table.rows[1].class_mark, Some(15.0));
        assert_invariants(&table);
    }

    #[test]
    fn test_table_from_labels_without_valid_rows() {
        let rows = [("oops", 1usize)];
        let err = table_from_labels(VariableType::ContinuousQuantitative, &rows).unwrap_err();
        assert_eq!(err.error_code(), "PARSE_ERROR");

        let err = table_from_labels(VariableType::Qualitative, &rows).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_VARIABLE_TYPE");
    }
}
