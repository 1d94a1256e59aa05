//! Quartile computation.
//!
//! Discrete columns use the `(n + 1) * k / 4` rank position on the sorted raw
//! values. Grouped columns interpolate inside the interval whose cumulative
//! frequency first reaches `k * n / 4`, reading the bounds from the table's
//! structured intervals.

use tracing::debug;

use crate::error::{Result, StatsError};
use crate::types::{FrequencyTable, Quartiles, VariableType};
use crate::utils::sorted;

/// Fewest raw observations for which quartiles are reported.
pub const MIN_OBSERVATIONS: usize = 4;

/// Compute Q1, Q2 and Q3.
///
/// Returns empty quartiles for qualitative columns or fewer than
/// [`MIN_OBSERVATIONS`] values. Fails with
/// [`StatsError::InvalidVariableType`] when `table` was built for another
/// type.
pub fn compute_quartiles(
    raw: &[f64],
    table: &FrequencyTable,
    variable_type: VariableType,
) -> Result<Quartiles> {
    if table.variable_type != variable_type {
        return Err(StatsError::InvalidVariableType(format!(
            "frequency table is {} but quartiles were requested for {}",
            table.variable_type, variable_type
        )));
    }

    if variable_type == VariableType::Qualitative || raw.len() < MIN_OBSERVATIONS {
        return Ok(Quartiles::empty());
    }

    let quartiles = match variable_type {
        VariableType::Qualitative => Quartiles::empty(),
        VariableType::DiscreteQuantitative => discrete_quartiles(raw),
        VariableType::DiscreteQuantitativeIntervaled | VariableType::ContinuousQuantitative => {
            grouped_quartiles(table)?
        }
    };

    debug!(
        q1 = ?quartiles.q1,
        q2 = ?quartiles.q2,
        q3 = ?quartiles.q3,
        "Computed quartiles"
    );
    Ok(quartiles)
}

fn discrete_quartiles(raw: &[f64]) -> Quartiles {
    let sorted = sorted(raw);
    let rank = |k: f64| rank_value(&sorted, (sorted.len() as f64 + 1.0) * k / 4.0);
    Quartiles {
        q1: rank(1.0),
        q2: rank(2.0),
        q3: rank(3.0),
    }
}

/// Value at 1-indexed `position`, interpolating between neighbouring ranks.
fn rank_value(sorted: &[f64], position: f64) -> Option<f64> {
    let n = sorted.len();
    let lower = position.floor() as usize;
    if lower == 0 || lower > n {
        return None;
    }

    let lower_value = sorted[lower - 1];
    let fraction = position - lower as f64;
    if fraction == 0.0 {
        return Some(lower_value);
    }
    let upper_value = if lower < n { sorted[lower] } else { lower_value };
    Some(lower_value + fraction * (upper_value - lower_value))
}

fn grouped_quartiles(table: &FrequencyTable) -> Result<Quartiles> {
    let rows: Vec<(f64, f64, f64)> = table
        .data_rows()
        .filter_map(|row| {
            let interval = row.label.interval()?;
            Some((interval.lower, interval.width(), row.absolute as f64))
        })
        .collect();

    if rows.is_empty() {
        return Err(StatsError::insufficient(1, 0));
    }

    let cumulative: Vec<f64> = rows
        .iter()
        .scan(0.0, |acc, (_, _, f)| {
            *acc += f;
            Some(*acc)
        })
        .collect();
    let n = cumulative.last().copied().unwrap_or(0.0);

    let quartile = |k: f64| -> Option<f64> {
        let position = k * n / 4.0;
        let idx = cumulative.iter().position(|cf| *cf >= position)?;
        let (lower, width, frequency) = rows[idx];
        if frequency <= 0.0 {
            return None;
        }
        let previous = if idx > 0 { cumulative[idx - 1] } else { 0.0 };
        Some(lower + (position - previous) / frequency * width)
    };

    Ok(Quartiles {
        q1: quartile(1.0),
        q2: quartile(2.0),
        q3: quartile(3.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::frequency::{build_frequency_table, table_from_labels};

    fn discrete_table(values: &[f64]) -> FrequencyTable {
        build_frequency_table(
            &Column::from_numbers("x", values),
            VariableType::DiscreteQuantitative,
        )
        .unwrap()
    }

    #[test]
    fn test_discrete_quartiles_interpolate() {
        let values = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 5.0];
        let q = compute_quartiles(&values, &discrete_table(&values), VariableType::DiscreteQuantitative)
            .unwrap();

        // Positions 2.5, 5 and 7.5
        assert_eq!(q.q1, Some(2.0));
        assert_eq!(q.q2, Some(3.0));
        assert_eq!(q.q3, Some(4.0));
    }

    #[test]
    fn test_discrete_quartiles_with_fractional_positions() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let q = compute_quartiles(&values, &discrete_table(&values), VariableType::DiscreteQuantitative)
            .unwrap();

        // Positions 1.25, 2.5 and 3.75
        assert_eq!(q.q1, Some(1.25));
        assert_eq!(q.q2, Some(2.5));
        assert_eq!(q.q3, Some(3.75));
    }

    #[test]
    fn test_grouped_quartiles() {
        let table = table_from_labels(
            VariableType::ContinuousQuantitative,
            &[
                ("[0 - 10)", 2usize),
                ("[10 - 20)", 3),
                ("[20 - 30)", 4),
                ("[30 - 40)", 1),
            ],
        )
        .unwrap();
        let raw = [0.0; 10];
        let q = compute_quartiles(&raw, &table, VariableType::ContinuousQuantitative).unwrap();

        // Q1 at 2.5: 10 + 0.5/3*10; Q2 at 5: 20; Q3 at 7.5: 20 + 2.5/4*10
        assert!((q.q1.unwrap() - (10.0 + 5.0 / 3.0)).abs() < 1e-9);
        assert!((q.q2.unwrap() - 20.0).abs() < 1e-9);
        assert!((q.q3.unwrap() - 26.25).abs() < 1e-9);
    }

    #[test]
    fn test_grouped_quartiles_of_constant_column_stay_near_the_value() {
        let values = [0.001; 10];
        let column = Column::from_numbers("x", &values);
        let variable_type = crate::profiler::classify(&column).unwrap();
        assert_eq!(variable_type, VariableType::ContinuousQuantitative);

        let table = build_frequency_table(&column, variable_type).unwrap();
        let q = compute_quartiles(&values, &table, variable_type).unwrap();

        let padding = crate::frequency::binning::LAST_EDGE_PADDING;
        for quartile in [q.q1, q.q2, q.q3] {
            let quartile = quartile.unwrap();
            assert!(quartile > 0.0, "{quartile}");
            assert!((quartile - 0.001).abs() <= padding, "{quartile}");
        }
    }

    #[test]
    fn test_qualitative_and_small_samples_are_empty() {
        let column = Column::from_texts("c", &["a", "b", "c", "d"]);
        let table = build_frequency_table(&column, VariableType::Qualitative).unwrap();
        assert!(
            compute_quartiles(&[], &table, VariableType::Qualitative)
                .unwrap()
                .is_empty()
        );

        let values = [1.0, 2.0, 3.0];
        let q = compute_quartiles(&values, &discrete_table(&values), VariableType::DiscreteQuantitative)
            .unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn test_mismatched_table_type_fails() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let err = compute_quartiles(
            &values,
            &discrete_table(&values),
            VariableType::ContinuousQuantitative,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_VARIABLE_TYPE");
        assert!(!err.is_recoverable());
    }
}
